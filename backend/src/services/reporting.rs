//! Reporting service for weekly and department summaries
//! Builds production and inventory roll-ups on top of the record store and entry book

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use shared::{
    week_window_with, Aggregation, Aggregator, DateRange, EntryScope, KeyFilter,
    ProductionSheet, RecordKey, WeekDay, WeekNumbering, WeekWindow,
};

use super::entries::EntryService;
use super::record_store::RecordStore;
use crate::error::AppResult;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    records: RecordStore,
    entries: EntryService,
    numbering: WeekNumbering,
}

/// How a report day was filled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Loaded,
    /// Nothing saved for the day
    Empty,
    /// The day's data could not be read; it contributes nothing to the week
    Failed,
}

/// One day of a weekly report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    #[serde(flatten)]
    pub day: WeekDay,
    /// Record the day was read from; inventory days come from the entry book
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub status: DayStatus,
    pub summary: Aggregation,
}

/// Weekly report for one branch and department
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    pub branch: String,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub window: WeekWindow,
    pub days: Vec<DailySummary>,
    pub week: Aggregation,
}

impl WeeklyReport {
    /// Dates whose data could not be read
    pub fn failed_days(&self) -> Vec<NaiveDate> {
        self.days
            .iter()
            .filter(|d| d.status == DayStatus::Failed)
            .map(|d| d.day.iso_date)
            .collect()
    }
}

/// Production roll-up for one department over a date range
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub department: String,
    /// Records that went into the summary
    pub records: usize,
    /// Records whose payload was not a production sheet
    pub skipped: usize,
    pub summary: Aggregation,
}

impl ReportingService {
    pub fn new(records: RecordStore, entries: EntryService, numbering: WeekNumbering) -> Self {
        Self {
            records,
            entries,
            numbering,
        }
    }

    /// Production for the week containing `anchor`.
    ///
    /// Days are loaded one after another. A day that fails to load is logged
    /// and reported as [`DayStatus::Failed`]; the rest of the week still comes
    /// back.
    #[tracing::instrument(skip(self))]
    pub async fn weekly_production(
        &self,
        anchor: NaiveDate,
        branch: &str,
        department: &str,
        group: Option<&str>,
    ) -> WeeklyReport {
        let window = week_window_with(anchor, self.numbering);
        let mut week = Aggregator::new();
        let mut days = Vec::with_capacity(window.days.len());

        for day in &window.days {
            let key = RecordKey::new(day.iso_date, branch, department, group);

            let (status, summary) = match self.records.load_as::<ProductionSheet>(&key).await {
                Ok(Some(sheet)) => {
                    week.extend(&sheet.items);
                    (DayStatus::Loaded, shared::aggregate(&sheet.items))
                }
                Ok(None) => (DayStatus::Empty, Aggregation::default()),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Skipping report day");
                    (DayStatus::Failed, Aggregation::default())
                }
            };

            days.push(DailySummary {
                day: day.clone(),
                key: Some(key.to_string()),
                status,
                summary,
            });
        }

        WeeklyReport {
            branch: branch.to_string(),
            department: department.to_string(),
            group: group.map(str::to_string),
            window,
            days,
            week: week.finish(),
        }
    }

    /// Inventory entries for the week containing `anchor`, bucketed per day.
    ///
    /// Unlike [`weekly_production`](Self::weekly_production), where `group`
    /// picks one record per day and `None` means the ungrouped record, here
    /// `group = None` takes entries from every group.
    #[tracing::instrument(skip(self))]
    pub async fn weekly_inventory(
        &self,
        anchor: NaiveDate,
        branch: &str,
        department: &str,
        group: Option<&str>,
    ) -> WeeklyReport {
        let window = week_window_with(anchor, self.numbering);
        let mut week = Aggregator::new();
        let mut days = Vec::with_capacity(window.days.len());

        for day in &window.days {
            let (status, summary) = match self
                .entries
                .list_day(day.iso_date, branch, department, group)
                .await
            {
                Ok(entries) if entries.is_empty() => (DayStatus::Empty, Aggregation::default()),
                Ok(entries) => {
                    week.extend(&entries);
                    (DayStatus::Loaded, shared::aggregate(&entries))
                }
                Err(e) => {
                    tracing::warn!(date = %day.iso_date, error = %e, "Skipping report day");
                    (DayStatus::Failed, Aggregation::default())
                }
            };

            days.push(DailySummary {
                day: day.clone(),
                key: None,
                status,
                summary,
            });
        }

        WeeklyReport {
            branch: branch.to_string(),
            department: department.to_string(),
            group: group.map(str::to_string),
            window,
            days,
            week: week.finish(),
        }
    }

    /// Production per department of `branch` over `range`, sorted by department
    #[tracing::instrument(skip(self))]
    pub async fn department_overview(
        &self,
        range: DateRange,
        branch: &str,
    ) -> AppResult<Vec<DepartmentSummary>> {
        let filter = KeyFilter::new().between(range).branch(branch);
        let records = self.records.list_by_prefix(&filter).await?;

        let mut departments: BTreeMap<String, (usize, usize, Aggregator)> = BTreeMap::new();
        for record in records {
            let (count, skipped, aggregator) = departments
                .entry(record.department.clone())
                .or_insert_with(|| (0, 0, Aggregator::new()));

            match record.payload_as::<ProductionSheet>() {
                Ok(sheet) => {
                    *count += 1;
                    aggregator.extend(&sheet.items);
                }
                Err(e) => {
                    *skipped += 1;
                    tracing::warn!(key = %record.key, error = %e, "Record is not a production sheet");
                }
            }
        }

        Ok(departments
            .into_iter()
            .map(|(department, (records, skipped, aggregator))| DepartmentSummary {
                department,
                records,
                skipped,
                summary: aggregator.finish(),
            })
            .collect())
    }

    /// Entry book totals for `scope`, categories in alphabetical order
    #[tracing::instrument(skip(self))]
    pub async fn inventory_summary(&self, scope: &EntryScope) -> AppResult<Aggregation> {
        let entries = self.entries.list_entries(scope).await?;
        Ok(shared::aggregate(&entries).sorted_by_group())
    }
}

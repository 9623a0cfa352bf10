//! Keyed record store: one payload per composite key
//!
//! Every mutation is a single statement against its own row. A save to one key
//! can never overwrite a concurrent save to another key, and replacing a
//! payload keeps the row's original `created_at`.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};

use shared::{normalize_label, KeyFilter, Record, RecordKey};

use crate::error::{AppError, AppResult};

const RECORD_COLUMNS: &str =
    "key, record_date, branch, department, group_name, payload, created_at_ms, updated_at_ms";

/// Record store backed by the `records` table
#[derive(Clone)]
pub struct RecordStore {
    db: SqlitePool,
}

/// Row for record queries
#[derive(Debug, FromRow)]
struct RecordRow {
    key: String,
    record_date: NaiveDate,
    branch: String,
    department: String,
    group_name: Option<String>,
    payload: Json<serde_json::Value>,
    created_at_ms: i64,
    updated_at_ms: i64,
}

impl TryFrom<RecordRow> for Record {
    type Error = AppError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(Record {
            created_at: millis_to_utc(row.created_at_ms, &row.key)?,
            updated_at: millis_to_utc(row.updated_at_ms, &row.key)?,
            key: row.key,
            date: row.record_date,
            branch: row.branch,
            department: row.department,
            group: row.group_name,
            payload: row.payload.0,
        })
    }
}

pub(crate) fn millis_to_utc(millis: i64, context: &str) -> AppResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| AppError::CorruptRow(format!("{context}: timestamp {millis} out of range")))
}

impl RecordStore {
    /// Create a new RecordStore instance
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert or replace the payload stored under `key`.
    ///
    /// Returns the row as stored; callers should use it (or reload) rather
    /// than keep their own copy of the payload.
    #[tracing::instrument(skip(self, payload), fields(key = %key))]
    pub async fn save(&self, key: &RecordKey, payload: &serde_json::Value) -> AppResult<Record> {
        let now = Utc::now().timestamp_millis();

        let row = sqlx::query_as::<_, RecordRow>(&format!(
            r#"
            INSERT INTO records (
                key, record_date, branch, department, group_name, payload,
                created_at_ms, updated_at_ms
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at_ms = MAX(records.updated_at_ms, excluded.updated_at_ms)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(key.as_str())
        .bind(key.date())
        .bind(key.branch())
        .bind(key.department())
        .bind(key.group())
        .bind(Json(payload))
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        let record = Record::try_from(row)?;
        tracing::debug!(
            replaced = record.created_at != record.updated_at,
            "Record saved"
        );
        Ok(record)
    }

    /// Serialize `payload` and save it under `key`
    pub async fn save_as<T: Serialize>(&self, key: &RecordKey, payload: &T) -> AppResult<Record> {
        let value = serde_json::to_value(payload)?;
        self.save(key, &value).await
    }

    /// Record stored under `key`, `None` when nothing was saved there
    #[tracing::instrument(skip(self), fields(key = %key))]
    pub async fn load(&self, key: &RecordKey) -> AppResult<Option<Record>> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE key = ?1"
        ))
        .bind(key.as_str())
        .fetch_optional(&self.db)
        .await?;

        row.map(Record::try_from).transpose()
    }

    /// Load and decode the payload stored under `key`
    pub async fn load_as<T: DeserializeOwned>(&self, key: &RecordKey) -> AppResult<Option<T>> {
        match self.load(key).await? {
            Some(record) => Ok(Some(record.payload_as()?)),
            None => Ok(None),
        }
    }

    /// Remove the record under `key`, returning how many rows went (0 or 1)
    #[tracing::instrument(skip(self), fields(key = %key))]
    pub async fn delete(&self, key: &RecordKey) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM records WHERE key = ?1")
            .bind(key.as_str())
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    /// Every record whose key parts match `filter`, ordered by key
    #[tracing::instrument(skip(self))]
    pub async fn list_by_prefix(&self, filter: &KeyFilter) -> AppResult<Vec<Record>> {
        let rows = sqlx::query_as::<_, RecordRow>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM records
            WHERE (?1 IS NULL OR record_date >= ?1)
              AND (?2 IS NULL OR record_date <= ?2)
              AND (?3 IS NULL OR branch = ?3)
              AND (?4 IS NULL OR department = ?4)
            ORDER BY key
            "#
        ))
        .bind(filter.dates.map(|range| range.start))
        .bind(filter.dates.map(|range| range.end))
        .bind(filter.branch.as_deref().map(normalize_label))
        .bind(filter.department.as_deref().map(normalize_label))
        .fetch_all(&self.db)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let record = Record::try_from(row)?;
            if filter.matches(&record.parts()) {
                records.push(record);
            }
        }

        Ok(records)
    }
}

//! Inventory and production line items

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::keys::{normalize_label, RecordKey};
use crate::types::{DateRange, RawNumber};

/// Treat an explicit `null` text field the same as a missing one
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Who encoded, counted and checked a sheet or entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribution {
    #[serde(default)]
    pub encoded_by: Option<String>,
    #[serde(default)]
    pub counted_by: Option<String>,
    #[serde(default)]
    pub checked_by: Option<String>,
}

/// One counted or produced line: what it is, how much, and what it is worth
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub item: String,
    #[serde(default)]
    pub quantity: RawNumber,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub unit: String,
    #[serde(default)]
    pub grams: RawNumber,
    #[serde(default)]
    pub price: RawNumber,
    #[serde(default)]
    pub amount: RawNumber,
}

impl LineItem {
    pub fn new(category: &str, item: &str) -> Self {
        Self {
            category: category.to_string(),
            item: item.to_string(),
            ..Self::default()
        }
    }

    pub fn with_quantity(mut self, quantity: impl Into<RawNumber>, unit: &str) -> Self {
        self.quantity = quantity.into();
        self.unit = unit.to_string();
        self
    }

    pub fn with_grams(mut self, grams: impl Into<RawNumber>) -> Self {
        self.grams = grams.into();
        self
    }

    pub fn with_price(mut self, price: impl Into<RawNumber>) -> Self {
        self.price = price.into();
        self
    }

    pub fn with_amount(mut self, amount: impl Into<RawNumber>) -> Self {
        self.amount = amount.into();
        self
    }
}

impl AsRef<LineItem> for LineItem {
    fn as_ref(&self) -> &LineItem {
        self
    }
}

/// A line item captured for one date, branch and department
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub date: NaiveDate,
    pub branch: String,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(flatten)]
    pub line: LineItem,
    #[serde(default)]
    pub attribution: Attribution,
}

impl Entry {
    pub fn new(date: NaiveDate, branch: &str, department: &str, line: LineItem) -> Self {
        Self {
            date,
            branch: branch.to_string(),
            department: department.to_string(),
            group: None,
            line,
            attribution: Attribution::default(),
        }
    }

    pub fn in_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    /// Natural key used for row-level replace and delete
    pub fn natural_key(&self) -> EntryKey {
        EntryKey::new(
            self.date,
            &self.branch,
            &self.department,
            self.group.as_deref(),
            &self.line.item,
        )
    }

    /// Composite key of the sheet this entry belongs to
    pub fn record_key(&self) -> RecordKey {
        RecordKey::new(
            self.date,
            &self.branch,
            &self.department,
            self.group.as_deref(),
        )
    }
}

impl AsRef<LineItem> for Entry {
    fn as_ref(&self) -> &LineItem {
        &self.line
    }
}

/// `(date, branch, department, group, item)` addressing one entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryKey {
    pub date: NaiveDate,
    pub branch: String,
    pub department: String,
    /// Empty when the entry has no group
    pub group: String,
    pub item: String,
}

impl EntryKey {
    pub fn new(
        date: NaiveDate,
        branch: &str,
        department: &str,
        group: Option<&str>,
        item: &str,
    ) -> Self {
        Self {
            date,
            branch: normalize_label(branch),
            department: normalize_label(department),
            group: group.map(normalize_label).unwrap_or_default(),
            item: item.to_string(),
        }
    }
}

/// Which entries a listing should return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryScope {
    pub dates: DateRange,
    pub branch: String,
    pub department: String,
    /// `None` lists every group
    #[serde(default)]
    pub group: Option<String>,
}

impl EntryScope {
    pub fn on(date: NaiveDate, branch: &str, department: &str) -> Self {
        Self {
            dates: DateRange::single(date),
            branch: normalize_label(branch),
            department: normalize_label(department),
            group: None,
        }
    }

    pub fn between(dates: DateRange, branch: &str, department: &str) -> Self {
        Self {
            dates,
            branch: normalize_label(branch),
            department: normalize_label(department),
            group: None,
        }
    }

    pub fn group(mut self, group: &str) -> Self {
        self.group = Some(normalize_label(group));
        self
    }
}

/// Payload of a production record: the day's line items in entry order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SheetRepr")]
pub struct ProductionSheet {
    pub items: Vec<LineItem>,
    pub attribution: Attribution,
}

/// Older sheets were saved as a bare array of lines.
///
/// `items` is required so that an unrelated object is not read as an empty sheet.
#[derive(Deserialize)]
#[serde(untagged)]
enum SheetRepr {
    Sheet {
        items: Vec<LineItem>,
        #[serde(default)]
        attribution: Attribution,
    },
    Lines(Vec<LineItem>),
}

impl From<SheetRepr> for ProductionSheet {
    fn from(repr: SheetRepr) -> Self {
        match repr {
            SheetRepr::Sheet { items, attribution } => Self { items, attribution },
            SheetRepr::Lines(items) => Self {
                items,
                attribution: Attribution::default(),
            },
        }
    }
}

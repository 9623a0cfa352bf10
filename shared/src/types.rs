//! Common types used across the ledger

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A numeric field exactly as it was captured on a form or in a stored payload.
///
/// Data-entry screens send numbers, numeric strings, blanks or nothing at all.
/// Aggregation reads these through [`parse_numeric_or_zero`], which never fails.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
    #[default]
    Missing,
    /// Booleans, arrays or objects that ended up in a numeric column
    Other(serde_json::Value),
}

impl RawNumber {
    /// Numeric value of the field, `0.0` when it cannot be read as a number
    pub fn value(&self) -> f64 {
        parse_numeric_or_zero(self)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, RawNumber::Missing)
    }
}

impl From<f64> for RawNumber {
    fn from(value: f64) -> Self {
        RawNumber::Number(value)
    }
}

impl From<i64> for RawNumber {
    fn from(value: i64) -> Self {
        RawNumber::Number(value as f64)
    }
}

impl From<&str> for RawNumber {
    fn from(value: &str) -> Self {
        RawNumber::Text(value.to_string())
    }
}

impl From<Option<f64>> for RawNumber {
    fn from(value: Option<f64>) -> Self {
        value.map_or(RawNumber::Missing, RawNumber::Number)
    }
}

/// Parse a captured numeric field, substituting `0.0` for anything unusable.
///
/// Numeric strings may carry surrounding whitespace and `,` thousands
/// separators (`" 1,250.50 "` reads as `1250.5`). Blank strings, non-numeric
/// text, non-finite values, missing fields and non-numeric JSON all read as 0.
pub fn parse_numeric_or_zero(raw: &RawNumber) -> f64 {
    let value = match raw {
        RawNumber::Number(n) => *n,
        RawNumber::Text(text) => parse_text(text),
        RawNumber::Missing | RawNumber::Other(_) => 0.0,
    };

    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn parse_text(text: &str) -> f64 {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().unwrap_or(0.0)
}

/// Inclusive date range for queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping the bounds when given in reverse
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every calendar day in the range, in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

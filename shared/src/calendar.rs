//! Week bucketing for weekly reports
//!
//! Weeks run Monday to Sunday. Week numbers follow the ledger's own
//! convention by default: week 1 starts on the first Monday on or after
//! January 1, and any date before that Monday is reported as week 52 of the
//! previous year. This is not ISO-8601; [`WeekNumbering::Iso`] selects
//! ISO week numbers instead.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::DateRange;

/// Week number given to dates that fall before the first Monday of their year
pub const CARRY_OVER_WEEK: u32 = 52;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    Unparsable(String),

    #[error("date '{0}' is outside years {min}-{max}", min = MIN_YEAR, max = MAX_YEAR)]
    OutOfRange(String),
}

/// Earliest and latest years accepted from text input. Week windows around
/// any date in this range stay inside chrono's calendar.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// Parse a `YYYY-MM-DD` date coming from a form, URL or command line
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, DateError> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| DateError::Unparsable(value.to_string()))?;

    if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        Ok(date)
    } else {
        Err(DateError::OutOfRange(value.to_string()))
    }
}

/// How week numbers are assigned to a week window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekNumbering {
    /// Weeks counted from the first Monday of the year, 52 before it
    #[default]
    Simplified,
    /// ISO-8601 week of the week's start date
    Iso,
}

impl WeekNumbering {
    pub fn number(self, start_date: NaiveDate) -> u32 {
        match self {
            WeekNumbering::Simplified => week_number(start_date),
            WeekNumbering::Iso => iso_week_number(start_date),
        }
    }
}

/// One day of a week window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekDay {
    pub day_name: String,
    pub iso_date: NaiveDate,
}

/// Monday-to-Sunday span used to bucket weekly reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekWindow {
    pub start_date: NaiveDate,
    pub days: [WeekDay; 7],
    pub week_number: u32,
}

impl WeekWindow {
    pub fn end_date(&self) -> NaiveDate {
        self.days[6].iso_date
    }

    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.range().contains(date)
    }
}

/// Full English day name, as printed on report headers
pub fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Monday of the week containing `anchor`
pub fn week_start(anchor: NaiveDate) -> NaiveDate {
    let weekday = anchor.weekday().num_days_from_sunday();
    let days_back = if weekday == 0 { 6 } else { weekday - 1 };
    anchor - Days::new(u64::from(days_back))
}

/// Week window containing `anchor`, numbered with the ledger's own convention
pub fn week_window(anchor: NaiveDate) -> WeekWindow {
    week_window_with(anchor, WeekNumbering::Simplified)
}

pub fn week_window_with(anchor: NaiveDate, numbering: WeekNumbering) -> WeekWindow {
    let start_date = week_start(anchor);
    let days = std::array::from_fn(|offset| {
        let iso_date = start_date + Days::new(offset as u64);
        WeekDay {
            day_name: day_name(iso_date.weekday()).to_string(),
            iso_date,
        }
    });

    WeekWindow {
        start_date,
        days,
        week_number: numbering.number(start_date),
    }
}

/// First Monday on or after January 1 of `date`'s year
pub fn first_monday_of_year(date: NaiveDate) -> NaiveDate {
    let jan_first = date - Days::new(u64::from(date.ordinal0()));
    let weekday = jan_first.weekday().num_days_from_sunday();
    jan_first + Days::new(u64::from((8 - weekday) % 7))
}

/// Week number of a week starting on `start_date`.
///
/// Dates before the year's first Monday return [`CARRY_OVER_WEEK`]. Years whose
/// first Monday is January 1 can reach week 53.
pub fn week_number(start_date: NaiveDate) -> u32 {
    let first_monday = first_monday_of_year(start_date);
    if start_date < first_monday {
        return CARRY_OVER_WEEK;
    }

    let elapsed = (start_date - first_monday).num_days();
    (elapsed / 7) as u32 + 1
}

pub fn iso_week_number(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

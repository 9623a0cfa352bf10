//! Business logic services for the branch ledger

pub mod entries;
pub mod record_store;
pub mod reporting;

pub use entries::{EntryService, StoredEntry};
pub use record_store::RecordStore;
pub use reporting::{DailySummary, DayStatus, DepartmentSummary, ReportingService, WeeklyReport};

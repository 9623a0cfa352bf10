//! Branch Ledger backend
//!
//! Keyed record store, entry book and weekly reports for multi-branch
//! production and inventory sheets.

use std::sync::Arc;

pub mod config;
pub mod db;
pub mod error;
pub mod services;

pub use crate::config::Config;
pub use error::{AppError, AppResult, ErrorDetail};

use services::{EntryService, RecordStore, ReportingService};

/// Application state shared across callers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: Arc<Config>,
    pub records: RecordStore,
    pub entries: EntryService,
    pub reporting: ReportingService,
}

impl AppState {
    /// Open the configured database and wire up the services
    pub async fn connect(config: Config) -> AppResult<Self> {
        let db = db::connect(&config.database).await?;
        Ok(Self::with_pool(db, config))
    }

    /// Wire up the services over an existing pool
    pub fn with_pool(db: sqlx::SqlitePool, config: Config) -> Self {
        let records = RecordStore::new(db.clone());
        let entries = EntryService::new(db.clone());
        let reporting = ReportingService::new(
            records.clone(),
            entries.clone(),
            config.reporting.week_numbering,
        );

        Self {
            db,
            config: Arc::new(config),
            records,
            entries,
            reporting,
        }
    }
}

//! Error handling for the branch ledger backend
//!
//! Store and report operations return [`AppResult`]; nothing panics across the
//! public API. Request layers turn an [`AppError`] into an [`ErrorDetail`]
//! and decide for themselves whether to retry.

use serde::Serialize;
use thiserror::Error;

/// SQLite primary result codes for a database held by another connection
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors
    #[error("Invalid record key: {0}")]
    InvalidKey(#[from] shared::KeyError),

    #[error("Invalid date: {0}")]
    InvalidDate(#[from] shared::DateError),

    #[error("Invalid payload: {0}")]
    Serialization(#[from] serde_json::Error),

    // Storage errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt stored row: {0}")]
    CorruptRow(String),

    // Setup errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    // Internal errors
    #[error("Internal error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Stable code for callers that branch on the kind of failure
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidKey(_) => "INVALID_KEY",
            AppError::InvalidDate(_) => "INVALID_DATE",
            AppError::Serialization(_) => "INVALID_PAYLOAD",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Migration(_) => "MIGRATION_ERROR",
            AppError::CorruptRow(_) => "CORRUPT_ROW",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the same call may succeed if simply repeated
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::DatabaseError(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) => true,
            AppError::DatabaseError(sqlx::Error::Database(e)) => e
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .map_or(false, |code| {
                    // extended result codes keep the primary code in the low byte
                    matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED)
                }),
            _ => false,
        }
    }

    /// Failure result handed to request layers
    pub fn detail(&self) -> ErrorDetail {
        tracing::error!("Error: {:?}", self);

        ErrorDetail {
            code: self.code().to_string(),
            message: self.to_string(),
            transient: self.is_transient(),
        }
    }
}

/// Serializable failure result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub transient: bool,
}

/// Result type alias for store and report operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_error_detail() {
        let err: AppError = shared::parse_key("bad").unwrap_err().into();
        let detail = err.detail();

        assert_eq!(detail.code, "INVALID_KEY");
        assert_eq!(detail.message, "Invalid record key: expected 3 or 4 key parts, found 1");
        assert!(!detail.transient);
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        let err = AppError::DatabaseError(sqlx::Error::PoolTimedOut);
        assert!(err.is_transient());
        assert_eq!(err.code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_row_not_found_is_not_transient() {
        assert!(!AppError::DatabaseError(sqlx::Error::RowNotFound).is_transient());
    }
}

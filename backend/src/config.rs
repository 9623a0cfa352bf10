//! Configuration management for the branch ledger
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with LEDGER_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::WeekNumbering;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Record store database
    pub database: DatabaseConfig,

    /// Report options
    #[serde(default)]
    pub reporting: ReportingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection URL, e.g. `sqlite://ledger.db`
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// How long a writer waits for a locked database, in seconds
    pub busy_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReportingConfig {
    /// `simplified` (default) or `iso`
    #[serde(default)]
    pub week_numbering: WeekNumbering,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("LEDGER_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let database = DatabaseConfig::default();

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("database.url", database.url)?
            .set_default("database.max_connections", i64::from(database.max_connections))?
            .set_default("database.min_connections", i64::from(database.min_connections))?
            .set_default("database.busy_timeout_secs", database.busy_timeout_secs as i64)?
            .set_default("reporting.week_numbering", "simplified")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (LEDGER_ prefix)
            .add_source(
                Environment::with_prefix("LEDGER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://ledger.db".to_string(),
            max_connections: 5,
            min_connections: 1,
            busy_timeout_secs: 5,
        }
    }
}

//! Admin configuration

use serde::Deserialize;

use crate::error::AdminError;

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}

/// Configuration for the `ledger-admin` binary
///
/// Loaded from `LEDGER_ADMIN_*` variables, after `.env` has been read.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// PostgreSQL connection string
    pub database_url: String,
    /// Log level or filter directive
    pub log_level: String,
    pub log_format: LogFormat,
    /// Pool size
    pub max_connections: u32,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/ledger".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Plain,
            max_connections: 5,
        }
    }
}

impl AdminConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, AdminError> {
        let config: Self = config::Config::builder()
            .add_source(config::Environment::with_prefix("LEDGER_ADMIN"))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the pool cannot work with
    pub fn validate(&self) -> Result<(), AdminError> {
        if self.database_url.trim().is_empty() {
            return Err(AdminError::Config("database_url must not be empty".to_string()));
        }
        if self.max_connections == 0 {
            return Err(AdminError::Config("max_connections must be at least 1".to_string()));
        }
        Ok(())
    }
}

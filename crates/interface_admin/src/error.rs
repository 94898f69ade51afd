//! Admin error handling

use thiserror::Error;

use domain_ledger::LedgerError;
use infra_db::DatabaseError;

/// Errors surfaced by `ledger-admin`
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

impl From<config::ConfigError> for AdminError {
    fn from(err: config::ConfigError) -> Self {
        AdminError::Config(err.to_string())
    }
}

impl AdminError {
    /// Process exit code for the error
    pub fn exit_code(&self) -> i32 {
        match self {
            AdminError::Config(_) | AdminError::InvalidArgument(_) => 2,
            AdminError::Database(_) => 3,
            AdminError::Ledger(err) => ledger_exit_code(err),
            AdminError::Output(_) => 1,
        }
    }
}

/// Process exit code for a failed ledger operation; corruption exits with 4
pub fn ledger_exit_code(err: &LedgerError) -> i32 {
    match err {
        LedgerError::Corruption { .. } => 4,
        LedgerError::Port(port) if port.is_transient() => 3,
        _ => 1,
    }
}

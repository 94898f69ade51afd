//! Kernel error type

use thiserror::Error;

use crate::money::AmountError;
use crate::temporal::TemporalError;

/// Failure in kernel-level validation of amounts, periods or settings
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Temporal(#[from] TemporalError),

    #[error("Invalid input: {0}")]
    Validation(String),

    /// A setting that would make the ledger unsafe to run
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        CoreError::Configuration(message.into())
    }
}

//! Ledger configuration

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{CoreError, BALANCE_TOLERANCE};

/// Tunables for the posting engine
///
/// Loaded from `LEDGER_*` environment variables; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Largest debit/credit difference still treated as balanced (exclusive)
    pub balance_tolerance: Decimal,
    /// Prefix of generated journal entry numbers
    pub entry_number_prefix: String,
    /// Zero-padded width of the numeric part of entry numbers
    pub entry_number_width: usize,
    /// Code given to auto-created accounts when the preferred code is unavailable
    pub fallback_account_code: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            balance_tolerance: BALANCE_TOLERANCE,
            entry_number_prefix: "JE-".to_string(),
            entry_number_width: 6,
            fallback_account_code: "9999".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("LEDGER"))
            .build()?
            .try_deserialize()
    }

    /// Sets the balance tolerance
    pub fn with_balance_tolerance(mut self, tolerance: Decimal) -> Self {
        self.balance_tolerance = tolerance;
        self
    }

    /// Sets the entry number prefix
    pub fn with_entry_number_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.entry_number_prefix = prefix.into();
        self
    }

    /// Checks the values for internal consistency
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Configuration` if the tolerance is not positive,
    /// the width is zero, or the fallback code is blank
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.balance_tolerance <= Decimal::ZERO {
            return Err(CoreError::configuration(format!(
                "balance_tolerance must be positive (got {})",
                self.balance_tolerance
            )));
        }
        if self.entry_number_width == 0 {
            return Err(CoreError::configuration("entry_number_width must be at least 1"));
        }
        if self.fallback_account_code.trim().is_empty() {
            return Err(CoreError::configuration("fallback_account_code must not be empty"));
        }
        Ok(())
    }

    /// Formats a sequence number as an entry number, e.g. `JE-000042`
    pub fn format_entry_number(&self, sequence: u64) -> String {
        format!(
            "{}{:0width$}",
            self.entry_number_prefix,
            sequence,
            width = self.entry_number_width
        )
    }

    /// Returns the entry number following `last`
    ///
    /// The numeric suffix of `last` is parsed and incremented; the prefix is
    /// always the configured one. A missing or unparsable suffix restarts at 1.
    pub fn next_entry_number(&self, last: Option<&str>) -> String {
        let sequence = last
            .and_then(|number| {
                let digits: String = number
                    .chars()
                    .rev()
                    .take_while(|c| c.is_ascii_digit())
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect();
                digits.parse::<u64>().ok()
            })
            .unwrap_or(0);
        self.format_entry_number(sequence.saturating_add(1))
    }
}

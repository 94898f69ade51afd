//! Ledger domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{AmountError, PortError};

/// Errors that can occur in the ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Referenced document, account or entry does not exist (or is tombstoned)
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Debit and credit totals differ by at least the balance tolerance
    #[error("Unbalanced entry {entry_number}: debits={debits}, credits={credits}, difference={difference}")]
    UnbalancedEntry {
        entry_number: String,
        debits: Decimal,
        credits: Decimal,
        difference: Decimal,
    },

    /// Tracked inventory would go negative
    #[error("Insufficient stock for {product}: required {required}, available {available}")]
    InsufficientStock {
        product: String,
        required: Decimal,
        available: Decimal,
    },

    /// Missing or malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Ledger-wide debits and credits disagree; recalculation refuses to run
    #[error("Ledger corruption: total debits {debits} do not equal total credits {credits} (difference {difference})")]
    Corruption {
        debits: Decimal,
        credits: Decimal,
        difference: Decimal,
    },

    /// Lifecycle transition not present in the transition table
    #[error("Invalid state transition for {entity}: {from} -> {to}")]
    InvalidStateTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// A non-voided entry already references this document
    #[error("Already posted: {reference}")]
    AlreadyPosted { reference: String },

    /// Storage adapter failure
    #[error("Storage error: {0}")]
    Port(#[from] PortError),

    /// Stored document could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LedgerError {
    /// Creates a NotFound error
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    /// Creates an InvalidStateTransition error
    pub fn invalid_transition(
        entity: &'static str,
        from: impl std::fmt::Debug,
        to: impl std::fmt::Debug,
    ) -> Self {
        LedgerError::InvalidStateTransition {
            entity,
            from: format!("{:?}", from),
            to: format!("{:?}", to),
        }
    }

    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::NotFound { .. } => "not_found",
            LedgerError::UnbalancedEntry { .. } => "unbalanced_entry",
            LedgerError::InsufficientStock { .. } => "insufficient_stock",
            LedgerError::Validation(_) => "validation",
            LedgerError::Corruption { .. } => "corruption",
            LedgerError::InvalidStateTransition { .. } => "invalid_state_transition",
            LedgerError::AlreadyPosted { .. } => "already_posted",
            LedgerError::Port(_) => "storage",
            LedgerError::Serialization(_) => "serialization",
        }
    }

    /// Returns true if this error signals that the document was posted concurrently
    pub fn is_already_posted(&self) -> bool {
        match self {
            LedgerError::AlreadyPosted { .. } => true,
            LedgerError::Port(port) => port.is_conflict(),
            _ => false,
        }
    }
}

impl From<AmountError> for LedgerError {
    fn from(error: AmountError) -> Self {
        LedgerError::Validation(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unbalanced_message_includes_discrepancy() {
        let error = LedgerError::UnbalancedEntry {
            entry_number: "JE-000001".to_string(),
            debits: dec!(100),
            credits: dec!(90),
            difference: dec!(10),
        };
        let message = error.to_string();
        assert!(message.contains("JE-000001"));
        assert!(message.contains("difference=10"));
        assert_eq!(error.code(), "unbalanced_entry");
    }

    #[test]
    fn test_conflict_is_already_posted() {
        let error: LedgerError = PortError::conflict("duplicate reference").into();
        assert!(error.is_already_posted());
        assert!(!LedgerError::validation("x").is_already_posted());
    }
}

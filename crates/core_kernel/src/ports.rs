//! Storage port plumbing
//!
//! The ledger talks to storage through the `LedgerStore` port declared in
//! `domain_ledger`. Adapters (the in-memory store and the PostgreSQL store
//! in `infra_db`) report failures as [`PortError`] and connectivity as
//! [`HealthCheckResult`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Adapter failure as seen by the ledger
#[derive(Debug, Error)]
pub enum PortError {
    #[error("{entity_type} {id} not found")]
    NotFound { entity_type: String, id: String },

    /// Rejected by a storage constraint
    #[error("Storage rejected the write: {message}")]
    Validation { message: String },

    /// Uniqueness violation; the engine replays idempotent posts on this
    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Storage unreachable: {message}")]
    Connection { message: String },

    /// A stored row could not be mapped back to a ledger type
    #[error("Cannot decode stored data: {message}")]
    Transformation { message: String },

    #[error("Storage failure: {message}")]
    Internal { message: String },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict { message: message.into() }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection { message: message.into() }
    }

    pub fn transformation(message: impl Into<String>) -> Self {
        PortError::Transformation { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal { message: message.into() }
    }

    /// Whether retrying the whole ledger transaction may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }
}

/// Bound shared by every storage port trait
pub trait DomainPort: Send + Sync + 'static {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Unhealthy,
}

/// Outcome of probing an adapter's backing store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub adapter_id: String,
    pub status: AdapterHealth,
    /// Round trip of the health check query
    pub latency_ms: u64,
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_the_entity() {
        let error = PortError::not_found("Account", "1200");
        assert!(error.is_not_found());
        assert!(!error.is_transient());
        assert_eq!(error.to_string(), "Account 1200 not found");
    }

    #[test]
    fn test_conflict_is_not_not_found() {
        let error = PortError::conflict("entry already exists for invoice");
        assert!(error.is_conflict());
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_only_connection_failures_are_transient() {
        assert!(PortError::connection("refused").is_transient());
        assert!(!PortError::validation("debit must not be negative").is_transient());
        assert!(!PortError::internal("boom").is_transient());
    }
}

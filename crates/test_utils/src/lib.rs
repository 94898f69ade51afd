//! Test Utilities Crate
//!
//! Shared test infrastructure for the ledger workspace.
//!
//! # Modules
//!
//! - `fixtures`: Predictable dates, amounts and document numbers
//! - `builders`: Builders for source documents and entry requests
//! - `harness`: In-memory ledger service with an initialized chart
//! - `database`: PostgreSQL testcontainers with the ledger schema
//! - `assertions`: Ledger-aware assertion helpers
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod harness;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use harness::LedgerHarness;
pub use database::*;
pub use assertions::*;
pub use generators::*;

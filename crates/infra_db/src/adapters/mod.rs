//! Domain Adapters
//!
//! Implementations of domain ports backed by PostgreSQL. An adapter
//! translates between domain models and repository rows and maps
//! `DatabaseError` to `PortError`.

pub mod ledger;

pub use ledger::{PgLedgerTransaction, PostgresLedgerStore};

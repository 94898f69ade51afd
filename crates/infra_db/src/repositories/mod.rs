//! Repository implementations
//!
//! Repositories hold the SQL. They work on a borrowed connection and map
//! rows to plain structs; converting to domain types is the adapters' job.

pub mod ledger;

pub use ledger::LedgerRepository;

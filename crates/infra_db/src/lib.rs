//! Infrastructure Database Layer
//!
//! PostgreSQL storage for the general ledger using SQLx.
//!
//! # Architecture
//!
//! - `repositories`: SQL against the ledger tables, one function per statement
//! - `adapters`: [`PostgresLedgerStore`], the `LedgerStore` port implementation
//! - `pool`: connection pool setup and embedded migrations
//!
//! Reads go through the `active_*` views, so tombstoned accounts, ledger rows
//! and documents are invisible to the domain. Each ledger transaction holds a
//! per-organization advisory lock until it commits or rolls back.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresLedgerStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/ledger")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresLedgerStore::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{PgLedgerTransaction, PostgresLedgerStore};
pub use error::{db_to_port_error, DatabaseError};
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use repositories::LedgerRepository;

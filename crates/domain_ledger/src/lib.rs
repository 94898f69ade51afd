//! Ledger Domain - Double-Entry Posting Engine
//!
//! This crate turns business documents into balanced journal entries, posts
//! them to the general ledger and keeps each account's running balance in
//! step with its ledger rows.
//!
//! # Double-Entry Accounting Principles
//!
//! Every economic event is recorded as matched debits and credits:
//! - Debits increase asset/expense accounts
//! - Credits increase liability/equity/revenue accounts
//! - A journal entry is posted only when its debits equal its credits
//!
//! # Layers
//!
//! - **Account registry** (`account`, `chart`): the chart of accounts and
//!   default-account resolution
//! - **Journal entry engine** (`journal`, `engine`): draft, post, void, reverse
//! - **Ledger poster** (`ledger`): one immutable row per posted line
//! - **Translators** (`translators`, `documents`, `lifecycle`): document
//!   lifecycles and the entries each posting transition produces
//! - **Reconciliation** (`reconciliation`, `reports`): health checks,
//!   recalculation and reports
//!
//! All reads and writes go through a [`LedgerTransaction`]; the
//! [`LedgerService`] wraps every operation in exactly one.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{LedgerService, LedgerConfig, MemoryLedgerStore};
//!
//! let service = LedgerService::new(Arc::new(MemoryLedgerStore::new()), LedgerConfig::default());
//! service.initialize_chart(org).await?;
//!
//! service.save_document(&invoice).await?;
//! let outcome = service.post_invoice(org, invoice.id, Some("clerk")).await?;
//! assert!(outcome.entry.is_balanced);
//! ```

pub mod account;
pub mod chart;
pub mod config;
pub mod documents;
pub mod engine;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod lifecycle;
pub mod memory;
pub mod ports;
pub mod reconciliation;
pub mod reports;
pub mod response;
pub mod service;
pub mod translators;

pub use account::{Account, AccountType};
pub use chart::DefaultAccount;
pub use config::LedgerConfig;
pub use documents::{DocumentKind, SourceDocument};
pub use error::LedgerError;
pub use journal::{EntryReference, EntryStatus, EntryType, JournalEntry, LineItem, NewJournalEntry};
pub use ledger::{LedgerRow, LedgerRowQuery};
pub use lifecycle::{Effect, Lifecycle};
pub use memory::MemoryLedgerStore;
pub use ports::{LedgerStore, LedgerTransaction};
pub use reconciliation::{HealthIssue, HealthReport, IssueKind, RecalculationReport, Severity};
pub use reports::{AccountStatement, AccountingEquation, TrialBalance};
pub use response::ActionResponse;
pub use service::LedgerService;
pub use translators::{CancellationOutcome, PostingOutcome};

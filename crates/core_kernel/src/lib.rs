//! Core Kernel - Foundational types and utilities for the ledger
//!
//! This crate provides the fundamental building blocks used across all crates:
//! - Amount helpers with precise decimal arithmetic
//! - Fiscal calendar types
//! - Strongly-typed identifiers
//! - Port infrastructure for storage adapters

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{AmountError, BALANCE_TOLERANCE, ensure_cents, round_amount, within_tolerance, sum_amounts};
pub use temporal::{FiscalPeriod, DateRange, TemporalError};
pub use identifiers::{
    OrganizationId, AccountId, JournalEntryId, LedgerRowId,
    InvoiceId, PaymentId, ReceiptId, CreditNoteId, SalesOrderId,
    BillId, BillPaymentId, ExpenseId, ProductId, StockAdjustmentId,
    AssetId, DepreciationId, ProjectId, ProjectTransactionId,
};
pub use error::CoreError;
pub use ports::{PortError, DomainPort, AdapterHealth, HealthCheckResult, HealthCheckable};

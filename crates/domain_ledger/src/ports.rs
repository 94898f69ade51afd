//! Storage ports for the ledger
//!
//! The ledger talks to storage exclusively through a [`LedgerTransaction`],
//! a unit of work scoped to one organization. Every service operation opens
//! one, performs all of its reads and writes through it, and then commits or
//! rolls back. Adapters serialize transactions per organization.
//!
//! Tombstoned rows (`deleted_at` set) are filtered by the adapter: read
//! methods only ever return the active view.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use core_kernel::{AccountId, DomainPort, JournalEntryId, OrganizationId, PortError};

use crate::account::Account;
use crate::documents::DocumentKind;
use crate::journal::{EntryStatus, JournalEntry};
use crate::ledger::{LedgerRow, LedgerRowQuery};

/// Opens organization-scoped units of work
#[async_trait]
pub trait LedgerStore: DomainPort {
    /// Begins a transaction for one organization
    ///
    /// Blocks until no other transaction of the same organization is open.
    async fn begin(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Box<dyn LedgerTransaction>, PortError>;
}

/// A unit of work over one organization's books
///
/// Nothing written through the transaction is visible to others until
/// [`commit`](LedgerTransaction::commit). Dropping an open transaction
/// discards its writes. Calls after commit or rollback fail with
/// `PortError::Internal`.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Organization the transaction is scoped to
    fn organization_id(&self) -> OrganizationId;

    // Accounts

    /// Gets an active account by ID
    async fn account(&mut self, id: AccountId) -> Result<Option<Account>, PortError>;

    /// Gets an active account by code
    async fn account_by_code(&mut self, code: &str) -> Result<Option<Account>, PortError>;

    /// Lists active accounts ordered by code
    async fn accounts(&mut self) -> Result<Vec<Account>, PortError>;

    /// Inserts an account; a duplicate code is a `Conflict`
    async fn insert_account(&mut self, account: &Account) -> Result<(), PortError>;

    /// Overwrites an account, including its tombstone
    async fn update_account(&mut self, account: &Account) -> Result<(), PortError>;

    // Journal entries

    /// Gets an entry by ID
    async fn entry(&mut self, id: JournalEntryId) -> Result<Option<JournalEntry>, PortError>;

    /// Lists entries, optionally filtered by status, in creation order
    async fn entries(&mut self, status: Option<EntryStatus>) -> Result<Vec<JournalEntry>, PortError>;

    /// Finds the non-voided entry referencing a document
    async fn entry_by_reference(
        &mut self,
        kind: DocumentKind,
        reference_id: Uuid,
    ) -> Result<Option<JournalEntry>, PortError>;

    /// Entry number of the most recently created entry
    async fn last_entry_number(&mut self) -> Result<Option<String>, PortError>;

    /// Inserts an entry
    ///
    /// A duplicate entry number, or a second non-voided entry for the same
    /// document reference, is a `Conflict`.
    async fn insert_entry(&mut self, entry: &JournalEntry) -> Result<(), PortError>;

    /// Overwrites an entry
    async fn update_entry(&mut self, entry: &JournalEntry) -> Result<(), PortError>;

    /// Removes a draft entry outright
    async fn delete_entry(&mut self, id: JournalEntryId) -> Result<(), PortError>;

    // Ledger rows

    /// Appends a ledger row
    async fn insert_ledger_row(&mut self, row: &LedgerRow) -> Result<(), PortError>;

    /// Lists active ledger rows in posting order
    async fn ledger_rows(&mut self, query: &LedgerRowQuery) -> Result<Vec<LedgerRow>, PortError>;

    /// Tombstones every row of an entry
    async fn tombstone_ledger_rows(
        &mut self,
        journal_entry_id: JournalEntryId,
        at: DateTime<Utc>,
    ) -> Result<u64, PortError>;

    // Source documents

    /// Gets an active document body
    async fn document(&mut self, kind: DocumentKind, id: Uuid) -> Result<Option<Value>, PortError>;

    /// Inserts or replaces a document body
    async fn put_document(&mut self, kind: DocumentKind, id: Uuid, body: &Value) -> Result<(), PortError>;

    /// Tombstones a document
    async fn delete_document(&mut self, kind: DocumentKind, id: Uuid) -> Result<(), PortError>;

    // Completion

    /// Makes all writes durable and visible
    async fn commit(&mut self) -> Result<(), PortError>;

    /// Discards all writes
    async fn rollback(&mut self) -> Result<(), PortError>;
}

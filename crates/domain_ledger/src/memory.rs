//! In-memory ledger store
//!
//! Each organization's books live behind their own async mutex. A
//! transaction holds that mutex for its whole lifetime and works on a copy of
//! the books, which replaces the original on commit. Writers of one
//! organization are therefore fully serialized and a failed operation leaves
//! nothing behind.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use core_kernel::{AccountId, DomainPort, JournalEntryId, OrganizationId, PortError};

use crate::account::Account;
use crate::documents::DocumentKind;
use crate::journal::{EntryStatus, JournalEntry};
use crate::ledger::{LedgerRow, LedgerRowQuery};
use crate::ports::{LedgerStore, LedgerTransaction};

/// A stored document body with its tombstone
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub body: Value,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Everything stored for one organization, tombstoned rows included
#[derive(Debug, Clone, Default)]
pub struct Books {
    pub accounts: Vec<Account>,
    /// In creation order
    pub entries: Vec<JournalEntry>,
    /// In posting order
    pub rows: Vec<LedgerRow>,
    pub documents: HashMap<(DocumentKind, Uuid), StoredDocument>,
}

/// Ledger store kept entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    organizations: Mutex<HashMap<OrganizationId, Arc<Mutex<Books>>>>,
}

impl MemoryLedgerStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    async fn books(&self, organization_id: OrganizationId) -> Arc<Mutex<Books>> {
        let mut organizations = self.organizations.lock().await;
        organizations.entry(organization_id).or_default().clone()
    }

    /// Copy of an organization's committed books, tombstones included
    pub async fn snapshot(&self, organization_id: OrganizationId) -> Books {
        self.books(organization_id).await.lock().await.clone()
    }

    /// Edits committed books directly, bypassing the ledger
    ///
    /// Intended for fixtures and for simulating corruption in tests.
    pub async fn edit<F>(&self, organization_id: OrganizationId, f: F)
    where
        F: FnOnce(&mut Books),
    {
        let books = self.books(organization_id).await;
        let mut guard = books.lock().await;
        f(&mut guard);
    }
}

impl DomainPort for MemoryLedgerStore {}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Box<dyn LedgerTransaction>, PortError> {
        let guard = self.books(organization_id).await.lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction {
            organization_id,
            guard: Some(guard),
            working,
        }))
    }
}

/// Open unit of work over a copy of the books
pub struct MemoryTransaction {
    organization_id: OrganizationId,
    guard: Option<OwnedMutexGuard<Books>>,
    working: Books,
}

impl MemoryTransaction {
    fn books(&mut self) -> Result<&mut Books, PortError> {
        if self.guard.is_none() {
            return Err(PortError::internal("transaction already finished"));
        }
        Ok(&mut self.working)
    }
}

fn is_live_reference(entry: &JournalEntry, other: &JournalEntry) -> bool {
    match (&entry.reference, &other.reference) {
        (Some(a), Some(b)) => {
            a.reference_type == b.reference_type
                && a.reference_id == b.reference_id
                && other.status != EntryStatus::Voided
        }
        _ => false,
    }
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    async fn account(&mut self, id: AccountId) -> Result<Option<Account>, PortError> {
        let books = self.books()?;
        Ok(books
            .accounts
            .iter()
            .find(|a| a.id == id && a.deleted_at.is_none())
            .cloned())
    }

    async fn account_by_code(&mut self, code: &str) -> Result<Option<Account>, PortError> {
        let books = self.books()?;
        Ok(books
            .accounts
            .iter()
            .find(|a| a.code == code && a.deleted_at.is_none())
            .cloned())
    }

    async fn accounts(&mut self) -> Result<Vec<Account>, PortError> {
        let books = self.books()?;
        let mut accounts: Vec<Account> = books
            .accounts
            .iter()
            .filter(|a| a.deleted_at.is_none())
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    async fn insert_account(&mut self, account: &Account) -> Result<(), PortError> {
        let books = self.books()?;
        if books
            .accounts
            .iter()
            .any(|a| a.deleted_at.is_none() && a.code == account.code)
        {
            return Err(PortError::conflict(format!("account code {} already exists", account.code)));
        }
        if books.accounts.iter().any(|a| a.id == account.id) {
            return Err(PortError::conflict(format!("account {} already exists", account.id)));
        }
        books.accounts.push(account.clone());
        Ok(())
    }

    async fn update_account(&mut self, account: &Account) -> Result<(), PortError> {
        let books = self.books()?;
        let slot = books
            .accounts
            .iter_mut()
            .find(|a| a.id == account.id && a.deleted_at.is_none())
            .ok_or_else(|| PortError::not_found("Account", account.id))?;
        *slot = account.clone();
        Ok(())
    }

    async fn entry(&mut self, id: JournalEntryId) -> Result<Option<JournalEntry>, PortError> {
        let books = self.books()?;
        Ok(books.entries.iter().find(|e| e.id == id).cloned())
    }

    async fn entries(&mut self, status: Option<EntryStatus>) -> Result<Vec<JournalEntry>, PortError> {
        let books = self.books()?;
        Ok(books
            .entries
            .iter()
            .filter(|e| status.map_or(true, |s| e.status == s))
            .cloned()
            .collect())
    }

    async fn entry_by_reference(
        &mut self,
        kind: DocumentKind,
        reference_id: Uuid,
    ) -> Result<Option<JournalEntry>, PortError> {
        let books = self.books()?;
        Ok(books
            .entries
            .iter()
            .find(|e| e.status != EntryStatus::Voided && e.references(kind, reference_id))
            .cloned())
    }

    async fn last_entry_number(&mut self) -> Result<Option<String>, PortError> {
        let books = self.books()?;
        Ok(books.entries.last().map(|e| e.entry_number.clone()))
    }

    async fn insert_entry(&mut self, entry: &JournalEntry) -> Result<(), PortError> {
        let books = self.books()?;
        if books.entries.iter().any(|e| e.entry_number == entry.entry_number) {
            return Err(PortError::conflict(format!(
                "entry number {} already exists",
                entry.entry_number
            )));
        }
        if entry.status != EntryStatus::Voided
            && books.entries.iter().any(|other| is_live_reference(entry, other))
        {
            return Err(PortError::conflict("a live entry already references this document"));
        }
        books.entries.push(entry.clone());
        Ok(())
    }

    async fn update_entry(&mut self, entry: &JournalEntry) -> Result<(), PortError> {
        let books = self.books()?;
        let slot = books
            .entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| PortError::not_found("JournalEntry", entry.id))?;
        *slot = entry.clone();
        Ok(())
    }

    async fn delete_entry(&mut self, id: JournalEntryId) -> Result<(), PortError> {
        let books = self.books()?;
        let before = books.entries.len();
        books.entries.retain(|e| e.id != id);
        if books.entries.len() == before {
            return Err(PortError::not_found("JournalEntry", id));
        }
        Ok(())
    }

    async fn insert_ledger_row(&mut self, row: &LedgerRow) -> Result<(), PortError> {
        let books = self.books()?;
        books.rows.push(row.clone());
        Ok(())
    }

    async fn ledger_rows(&mut self, query: &LedgerRowQuery) -> Result<Vec<LedgerRow>, PortError> {
        let books = self.books()?;
        Ok(books
            .rows
            .iter()
            .filter(|r| r.deleted_at.is_none() && query.matches(r))
            .cloned()
            .collect())
    }

    async fn tombstone_ledger_rows(
        &mut self,
        journal_entry_id: JournalEntryId,
        at: DateTime<Utc>,
    ) -> Result<u64, PortError> {
        let books = self.books()?;
        let mut count = 0;
        for row in books
            .rows
            .iter_mut()
            .filter(|r| r.journal_entry_id == journal_entry_id && r.deleted_at.is_none())
        {
            row.deleted_at = Some(at);
            count += 1;
        }
        Ok(count)
    }

    async fn document(&mut self, kind: DocumentKind, id: Uuid) -> Result<Option<Value>, PortError> {
        let books = self.books()?;
        Ok(books
            .documents
            .get(&(kind, id))
            .filter(|d| d.deleted_at.is_none())
            .map(|d| d.body.clone()))
    }

    async fn put_document(&mut self, kind: DocumentKind, id: Uuid, body: &Value) -> Result<(), PortError> {
        let books = self.books()?;
        books.documents.insert(
            (kind, id),
            StoredDocument {
                body: body.clone(),
                updated_at: Utc::now(),
                deleted_at: None,
            },
        );
        Ok(())
    }

    async fn delete_document(&mut self, kind: DocumentKind, id: Uuid) -> Result<(), PortError> {
        let books = self.books()?;
        let document = books
            .documents
            .get_mut(&(kind, id))
            .filter(|d| d.deleted_at.is_none())
            .ok_or_else(|| PortError::not_found(kind.entity_name(), id))?;
        document.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), PortError> {
        let mut guard = self
            .guard
            .take()
            .ok_or_else(|| PortError::internal("transaction already finished"))?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), PortError> {
        self.guard
            .take()
            .ok_or_else(|| PortError::internal("transaction already finished"))?;
        self.working = Books::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountType;

    fn cash(org: OrganizationId) -> Account {
        Account::new(org, "1000", "Cash", AccountType::Asset)
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = MemoryLedgerStore::new();
        let org = OrganizationId::new();

        let mut tx = store.begin(org).await.unwrap();
        tx.insert_account(&cash(org)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.snapshot(org).await.accounts.len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = MemoryLedgerStore::new();
        let org = OrganizationId::new();

        let mut tx = store.begin(org).await.unwrap();
        tx.insert_account(&cash(org)).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(store.snapshot(org).await.accounts.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = MemoryLedgerStore::new();
        let org = OrganizationId::new();

        {
            let mut tx = store.begin(org).await.unwrap();
            tx.insert_account(&cash(org)).await.unwrap();
        }

        assert!(store.snapshot(org).await.accounts.is_empty());
    }

    #[tokio::test]
    async fn test_finished_transaction_rejects_calls() {
        let store = MemoryLedgerStore::new();
        let org = OrganizationId::new();

        let mut tx = store.begin(org).await.unwrap();
        tx.commit().await.unwrap();
        assert!(tx.accounts().await.is_err());
        assert!(tx.commit().await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_account_code_conflicts() {
        let store = MemoryLedgerStore::new();
        let org = OrganizationId::new();

        let mut tx = store.begin(org).await.unwrap();
        tx.insert_account(&cash(org)).await.unwrap();
        let error = tx.insert_account(&cash(org)).await.unwrap_err();
        assert!(error.is_conflict());
    }

    #[tokio::test]
    async fn test_tombstoned_account_is_hidden() {
        let store = MemoryLedgerStore::new();
        let org = OrganizationId::new();
        let mut account = cash(org);

        let mut tx = store.begin(org).await.unwrap();
        tx.insert_account(&account).await.unwrap();
        account.deleted_at = Some(Utc::now());
        tx.update_account(&account).await.unwrap();

        assert!(tx.account(account.id).await.unwrap().is_none());
        assert!(tx.accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_organizations_are_isolated() {
        let store = MemoryLedgerStore::new();
        let first = OrganizationId::new();
        let second = OrganizationId::new();

        let mut tx = store.begin(first).await.unwrap();
        tx.insert_account(&cash(first)).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin(second).await.unwrap();
        assert!(tx.accounts().await.unwrap().is_empty());
    }
}

//! In-memory ledger harness
//!
//! A [`LedgerService`] over a [`MemoryLedgerStore`] with one organization
//! whose standard chart is already initialized.

use std::sync::Arc;

use core_kernel::{AccountId, OrganizationId};
use domain_ledger::chart::DefaultAccount;
use domain_ledger::memory::Books;
use domain_ledger::{
    Account, JournalEntry, LedgerConfig, LedgerRow, LedgerService, LedgerStore, MemoryLedgerStore,
};
use rust_decimal::Decimal;

use crate::builders::EntryBuilder;

/// Service, store and organization for one test
pub struct LedgerHarness {
    pub store: Arc<MemoryLedgerStore>,
    pub service: LedgerService,
    pub organization_id: OrganizationId,
}

impl LedgerHarness {
    /// Harness with the default configuration
    pub async fn new() -> Self {
        Self::with_config(LedgerConfig::default()).await
    }

    /// Harness with a custom configuration
    pub async fn with_config(config: LedgerConfig) -> Self {
        let store = Arc::new(MemoryLedgerStore::new());
        let service = LedgerService::new(store.clone() as Arc<dyn LedgerStore>, config);
        let organization_id = OrganizationId::new();
        service
            .initialize_chart(organization_id)
            .await
            .expect("standard chart should initialize");
        Self {
            store,
            service,
            organization_id,
        }
    }

    /// Current state of the default account for a role
    pub async fn account(&self, role: DefaultAccount) -> Account {
        self.service
            .resolve_default_account(self.organization_id, role)
            .await
            .expect("default account should resolve")
    }

    pub async fn account_id(&self, role: DefaultAccount) -> AccountId {
        self.account(role).await.id
    }

    /// Net balance of the default account for a role
    pub async fn balance(&self, role: DefaultAccount) -> Decimal {
        self.account(role).await.current_balance
    }

    /// Posts a two-line transfer between roles
    pub async fn post_transfer(&self, debit: DefaultAccount, credit: DefaultAccount, amount: Decimal) -> JournalEntry {
        let request = EntryBuilder::new(format!("{:?} to {:?}", credit, debit))
            .transfer(self.account_id(debit).await, self.account_id(credit).await, amount)
            .build();
        self.service
            .create_and_post(self.organization_id, request)
            .await
            .expect("transfer should post")
    }

    /// Every account of the organization
    pub async fn accounts(&self) -> Vec<Account> {
        self.service
            .accounts(self.organization_id)
            .await
            .expect("accounts should load")
    }

    /// Active ledger rows of the organization
    pub async fn ledger_rows(&self) -> Vec<LedgerRow> {
        self.books()
            .await
            .rows
            .into_iter()
            .filter(|row| row.deleted_at.is_none())
            .collect()
    }

    /// Committed books including tombstones
    pub async fn books(&self) -> Books {
        self.store.snapshot(self.organization_id).await
    }
}

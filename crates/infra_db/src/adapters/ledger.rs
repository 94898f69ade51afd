//! PostgreSQL Ledger Adapter
//!
//! Implements the ledger's storage ports on top of [`LedgerRepository`].
//! `begin` opens a database transaction and takes a transaction-scoped
//! advisory lock keyed on the organization, so posting runs for one
//! organization queue behind each other while other organizations proceed.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLedgerStore;
//! use domain_ledger::{LedgerService, LedgerConfig};
//! use std::sync::Arc;
//!
//! let store = PostgresLedgerStore::new(pool);
//! let service = LedgerService::new(Arc::new(store), LedgerConfig::default());
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgConnection, Postgres};
use sqlx::{PgPool, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AccountId, AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, JournalEntryId,
    LedgerRowId, OrganizationId, PortError,
};
use domain_ledger::{
    Account, AccountType, DocumentKind, EntryReference, EntryStatus, EntryType, JournalEntry,
    LedgerRow, LedgerRowQuery, LedgerStore, LedgerTransaction, LineItem,
};

use crate::error::{db_to_port_error, DatabaseError};
use crate::repositories::ledger::{
    AccountRow, AccountType as DbAccountType, EntryStatus as DbEntryStatus,
    EntryType as DbEntryType, JournalEntryRow, LedgerRepository, LedgerRowFilter, LedgerRowRecord,
};

const ADAPTER_ID: &str = "postgres-ledger-store";

/// PostgreSQL-backed [`LedgerStore`]
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for migrations and ad-hoc queries
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DomainPort for PostgresLedgerStore {}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self), fields(organization_id = %organization_id))]
    async fn begin(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Box<dyn LedgerTransaction>, PortError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_to_port_error(DatabaseError::from(e)))?;

        LedgerRepository::lock_organization(&mut *tx, *organization_id.as_uuid())
            .await
            .map_err(db_to_port_error)?;

        debug!("Ledger transaction opened");
        Ok(Box::new(PgLedgerTransaction {
            organization_id,
            tx: Some(tx),
        }))
    }
}

#[async_trait]
impl HealthCheckable for PostgresLedgerStore {
    /// Runs `SELECT 1` against the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

/// One organization's open database transaction
///
/// Dropping it without commit rolls the database transaction back.
pub struct PgLedgerTransaction {
    organization_id: OrganizationId,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgLedgerTransaction {
    fn conn(&mut self) -> Result<&mut PgConnection, PortError> {
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(PortError::internal("ledger transaction already finished")),
        }
    }

    fn org(&self) -> Uuid {
        *self.organization_id.as_uuid()
    }
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    async fn account(&mut self, id: AccountId) -> Result<Option<Account>, PortError> {
        let org = self.org();
        LedgerRepository::find_account(self.conn()?, org, *id.as_uuid())
            .await
            .map_err(db_to_port_error)?
            .map(row_to_account)
            .transpose()
    }

    async fn account_by_code(&mut self, code: &str) -> Result<Option<Account>, PortError> {
        let org = self.org();
        LedgerRepository::find_account_by_code(self.conn()?, org, code)
            .await
            .map_err(db_to_port_error)?
            .map(row_to_account)
            .transpose()
    }

    async fn accounts(&mut self) -> Result<Vec<Account>, PortError> {
        let org = self.org();
        LedgerRepository::list_accounts(self.conn()?, org)
            .await
            .map_err(db_to_port_error)?
            .into_iter()
            .map(row_to_account)
            .collect()
    }

    #[instrument(skip(self, account), fields(code = %account.code))]
    async fn insert_account(&mut self, account: &Account) -> Result<(), PortError> {
        let row = account_to_row(account);
        LedgerRepository::insert_account(self.conn()?, &row)
            .await
            .map_err(db_to_port_error)
    }

    async fn update_account(&mut self, account: &Account) -> Result<(), PortError> {
        let row = account_to_row(account);
        let affected = LedgerRepository::update_account(self.conn()?, &row)
            .await
            .map_err(db_to_port_error)?;
        if affected == 0 {
            return Err(PortError::not_found("Account", account.id));
        }
        Ok(())
    }

    async fn entry(&mut self, id: JournalEntryId) -> Result<Option<JournalEntry>, PortError> {
        let org = self.org();
        LedgerRepository::find_entry(self.conn()?, org, *id.as_uuid())
            .await
            .map_err(db_to_port_error)?
            .map(row_to_entry)
            .transpose()
    }

    async fn entries(&mut self, status: Option<EntryStatus>) -> Result<Vec<JournalEntry>, PortError> {
        let org = self.org();
        LedgerRepository::list_entries(self.conn()?, org, status.map(status_to_db))
            .await
            .map_err(db_to_port_error)?
            .into_iter()
            .map(row_to_entry)
            .collect()
    }

    async fn entry_by_reference(
        &mut self,
        kind: DocumentKind,
        reference_id: Uuid,
    ) -> Result<Option<JournalEntry>, PortError> {
        let org = self.org();
        LedgerRepository::find_entry_by_reference(self.conn()?, org, kind.as_str(), reference_id)
            .await
            .map_err(db_to_port_error)?
            .map(row_to_entry)
            .transpose()
    }

    async fn last_entry_number(&mut self) -> Result<Option<String>, PortError> {
        let org = self.org();
        LedgerRepository::last_entry_number(self.conn()?, org)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, entry), fields(entry_number = %entry.entry_number))]
    async fn insert_entry(&mut self, entry: &JournalEntry) -> Result<(), PortError> {
        let row = entry_to_row(entry)?;
        LedgerRepository::insert_entry(self.conn()?, &row)
            .await
            .map_err(db_to_port_error)
    }

    async fn update_entry(&mut self, entry: &JournalEntry) -> Result<(), PortError> {
        let row = entry_to_row(entry)?;
        let affected = LedgerRepository::update_entry(self.conn()?, &row)
            .await
            .map_err(db_to_port_error)?;
        if affected == 0 {
            return Err(PortError::not_found("Journal entry", entry.id));
        }
        Ok(())
    }

    async fn delete_entry(&mut self, id: JournalEntryId) -> Result<(), PortError> {
        let org = self.org();
        let affected = LedgerRepository::delete_draft_entry(self.conn()?, org, *id.as_uuid())
            .await
            .map_err(db_to_port_error)?;
        if affected == 0 {
            return Err(PortError::not_found("Draft journal entry", id));
        }
        Ok(())
    }

    async fn insert_ledger_row(&mut self, row: &LedgerRow) -> Result<(), PortError> {
        let record = ledger_row_to_record(row)?;
        LedgerRepository::insert_ledger_row(self.conn()?, &record)
            .await
            .map_err(db_to_port_error)
    }

    async fn ledger_rows(&mut self, query: &LedgerRowQuery) -> Result<Vec<LedgerRow>, PortError> {
        let org = self.org();
        let filter = LedgerRowFilter {
            account_id: query.account_id.map(Uuid::from),
            journal_entry_id: query.journal_entry_id.map(Uuid::from),
            from: query.dates.start,
            to: query.dates.end,
        };
        LedgerRepository::list_ledger_rows(self.conn()?, org, &filter)
            .await
            .map_err(db_to_port_error)?
            .into_iter()
            .map(record_to_ledger_row)
            .collect()
    }

    async fn tombstone_ledger_rows(
        &mut self,
        journal_entry_id: JournalEntryId,
        at: DateTime<Utc>,
    ) -> Result<u64, PortError> {
        let org = self.org();
        LedgerRepository::tombstone_ledger_rows(self.conn()?, org, *journal_entry_id.as_uuid(), at)
            .await
            .map_err(db_to_port_error)
    }

    async fn document(&mut self, kind: DocumentKind, id: Uuid) -> Result<Option<Value>, PortError> {
        let org = self.org();
        LedgerRepository::find_document(self.conn()?, org, kind.as_str(), id)
            .await
            .map_err(db_to_port_error)
    }

    async fn put_document(&mut self, kind: DocumentKind, id: Uuid, body: &Value) -> Result<(), PortError> {
        let org = self.org();
        LedgerRepository::upsert_document(self.conn()?, org, kind.as_str(), id, body)
            .await
            .map_err(db_to_port_error)
    }

    async fn delete_document(&mut self, kind: DocumentKind, id: Uuid) -> Result<(), PortError> {
        let org = self.org();
        let affected = LedgerRepository::tombstone_document(self.conn()?, org, kind.as_str(), id)
            .await
            .map_err(db_to_port_error)?;
        if affected == 0 {
            return Err(PortError::not_found(kind.entity_name(), id));
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), PortError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| PortError::internal("ledger transaction already finished"))?;
        tx.commit()
            .await
            .map_err(|e| db_to_port_error(DatabaseError::TransactionFailed(e.to_string())))?;
        debug!(organization_id = %self.organization_id, "Ledger transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), PortError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| PortError::internal("ledger transaction already finished"))?;
        tx.rollback()
            .await
            .map_err(|e| db_to_port_error(DatabaseError::TransactionFailed(e.to_string())))?;
        debug!(organization_id = %self.organization_id, "Ledger transaction rolled back");
        Ok(())
    }
}

// Type conversion helpers

fn account_type_to_db(t: AccountType) -> DbAccountType {
    match t {
        AccountType::Asset => DbAccountType::Asset,
        AccountType::Liability => DbAccountType::Liability,
        AccountType::Equity => DbAccountType::Equity,
        AccountType::Revenue => DbAccountType::Revenue,
        AccountType::Expense => DbAccountType::Expense,
    }
}

fn db_to_account_type(t: DbAccountType) -> AccountType {
    match t {
        DbAccountType::Asset => AccountType::Asset,
        DbAccountType::Liability => AccountType::Liability,
        DbAccountType::Equity => AccountType::Equity,
        DbAccountType::Revenue => AccountType::Revenue,
        DbAccountType::Expense => AccountType::Expense,
    }
}

fn entry_type_to_db(t: EntryType) -> DbEntryType {
    match t {
        EntryType::Manual => DbEntryType::Manual,
        EntryType::Automated => DbEntryType::Automated,
        EntryType::Adjustment => DbEntryType::Adjustment,
        EntryType::Closing => DbEntryType::Closing,
        EntryType::Opening => DbEntryType::Opening,
        EntryType::Reversal => DbEntryType::Reversal,
    }
}

fn db_to_entry_type(t: DbEntryType) -> EntryType {
    match t {
        DbEntryType::Manual => EntryType::Manual,
        DbEntryType::Automated => EntryType::Automated,
        DbEntryType::Adjustment => EntryType::Adjustment,
        DbEntryType::Closing => EntryType::Closing,
        DbEntryType::Opening => EntryType::Opening,
        DbEntryType::Reversal => EntryType::Reversal,
    }
}

fn status_to_db(s: EntryStatus) -> DbEntryStatus {
    match s {
        EntryStatus::Draft => DbEntryStatus::Draft,
        EntryStatus::Posted => DbEntryStatus::Posted,
        EntryStatus::Voided => DbEntryStatus::Voided,
    }
}

fn db_to_status(s: DbEntryStatus) -> EntryStatus {
    match s {
        DbEntryStatus::Draft => EntryStatus::Draft,
        DbEntryStatus::Posted => EntryStatus::Posted,
        DbEntryStatus::Voided => EntryStatus::Voided,
    }
}

fn account_to_row(account: &Account) -> AccountRow {
    AccountRow {
        id: *account.id.as_uuid(),
        organization_id: *account.organization_id.as_uuid(),
        code: account.code.clone(),
        name: account.name.clone(),
        account_type: account_type_to_db(account.account_type),
        subtype: account.subtype.clone(),
        parent_id: account.parent_id.map(Uuid::from),
        is_parent: account.is_parent,
        is_active: account.is_active,
        is_system_account: account.is_system_account,
        description: account.description.clone(),
        debit_balance: account.debit_balance,
        credit_balance: account.credit_balance,
        current_balance: account.current_balance,
        created_at: account.created_at,
        updated_at: account.updated_at,
        deleted_at: account.deleted_at,
    }
}

fn row_to_account(row: AccountRow) -> Result<Account, PortError> {
    Ok(Account {
        id: AccountId::from(row.id),
        organization_id: OrganizationId::from(row.organization_id),
        code: row.code,
        name: row.name,
        account_type: db_to_account_type(row.account_type),
        subtype: row.subtype,
        parent_id: row.parent_id.map(AccountId::from),
        is_parent: row.is_parent,
        is_active: row.is_active,
        is_system_account: row.is_system_account,
        description: row.description,
        debit_balance: row.debit_balance,
        credit_balance: row.credit_balance,
        current_balance: row.current_balance,
        created_at: row.created_at,
        updated_at: row.updated_at,
        deleted_at: row.deleted_at,
    })
}

fn entry_to_row(entry: &JournalEntry) -> Result<JournalEntryRow, PortError> {
    let lines = serde_json::to_value(&entry.lines)
        .map_err(|e| db_to_port_error(DatabaseError::from(e)))?;
    let reference = entry.reference.as_ref();

    Ok(JournalEntryRow {
        id: *entry.id.as_uuid(),
        organization_id: *entry.organization_id.as_uuid(),
        entry_number: entry.entry_number.clone(),
        entry_date: entry.entry_date,
        entry_type: entry_type_to_db(entry.entry_type),
        reference_type: reference.map(|r| r.reference_type.as_str().to_string()),
        reference_id: reference.map(|r| r.reference_id),
        reference_number: reference.and_then(|r| r.reference_number.clone()),
        description: entry.description.clone(),
        lines,
        total_debit: entry.total_debit,
        total_credit: entry.total_credit,
        is_balanced: entry.is_balanced,
        status: status_to_db(entry.status),
        created_by: entry.created_by.clone(),
        created_at: entry.created_at,
        updated_at: entry.updated_at,
        posted_by: entry.posted_by.clone(),
        posted_at: entry.posted_at,
        voided_by: entry.voided_by.clone(),
        voided_at: entry.voided_at,
        void_reason: entry.void_reason.clone(),
        reversed_by: entry.reversed_by.map(Uuid::from),
        reversal_of: entry.reversal_of.map(Uuid::from),
    })
}

fn row_to_entry(row: JournalEntryRow) -> Result<JournalEntry, PortError> {
    let lines: Vec<LineItem> = serde_json::from_value(row.lines)
        .map_err(|e| db_to_port_error(DatabaseError::from(e)))?;

    let reference = match (row.reference_type, row.reference_id) {
        (Some(kind), Some(reference_id)) => {
            let reference_type: DocumentKind = kind
                .parse()
                .map_err(|_| PortError::transformation(format!("unknown reference type '{}'", kind)))?;
            Some(EntryReference {
                reference_type,
                reference_id,
                reference_number: row.reference_number,
            })
        }
        _ => None,
    };

    Ok(JournalEntry {
        id: JournalEntryId::from(row.id),
        organization_id: OrganizationId::from(row.organization_id),
        entry_number: row.entry_number,
        entry_date: row.entry_date,
        entry_type: db_to_entry_type(row.entry_type),
        reference,
        description: row.description,
        lines,
        total_debit: row.total_debit,
        total_credit: row.total_credit,
        is_balanced: row.is_balanced,
        status: db_to_status(row.status),
        created_by: row.created_by,
        created_at: row.created_at,
        updated_at: row.updated_at,
        posted_by: row.posted_by,
        posted_at: row.posted_at,
        voided_by: row.voided_by,
        voided_at: row.voided_at,
        void_reason: row.void_reason,
        reversed_by: row.reversed_by.map(JournalEntryId::from),
        reversal_of: row.reversal_of.map(JournalEntryId::from),
    })
}

fn ledger_row_to_record(row: &LedgerRow) -> Result<LedgerRowRecord, PortError> {
    let fiscal_period = i32::try_from(row.fiscal_period)
        .map_err(|_| PortError::transformation(format!("fiscal period {} out of range", row.fiscal_period)))?;

    Ok(LedgerRowRecord {
        id: *row.id.as_uuid(),
        organization_id: *row.organization_id.as_uuid(),
        account_id: *row.account_id.as_uuid(),
        journal_entry_id: *row.journal_entry_id.as_uuid(),
        entry_number: row.entry_number.clone(),
        transaction_date: row.transaction_date,
        description: row.description.clone(),
        debit: row.debit,
        credit: row.credit,
        running_balance: row.running_balance,
        fiscal_year: row.fiscal_year,
        fiscal_period,
        is_reconciled: row.is_reconciled,
        created_at: row.created_at,
        deleted_at: row.deleted_at,
    })
}

fn record_to_ledger_row(record: LedgerRowRecord) -> Result<LedgerRow, PortError> {
    let fiscal_period = u32::try_from(record.fiscal_period)
        .map_err(|_| PortError::transformation(format!("fiscal period {} out of range", record.fiscal_period)))?;

    Ok(LedgerRow {
        id: LedgerRowId::from(record.id),
        organization_id: OrganizationId::from(record.organization_id),
        account_id: AccountId::from(record.account_id),
        journal_entry_id: JournalEntryId::from(record.journal_entry_id),
        entry_number: record.entry_number,
        transaction_date: record.transaction_date,
        description: record.description,
        debit: record.debit,
        credit: record.credit,
        running_balance: record.running_balance,
        fiscal_year: record.fiscal_year,
        fiscal_period,
        is_reconciled: record.is_reconciled,
        created_at: record.created_at,
        deleted_at: record.deleted_at,
    })
}

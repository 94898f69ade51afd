//! General ledger rows and the ledger poster
//!
//! One row is written per posted line item. A row is immutable once written;
//! voiding the parent entry tombstones it at the storage layer.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, DateRange, FiscalPeriod, JournalEntryId, LedgerRowId, OrganizationId};

use crate::error::LedgerError;
use crate::journal::{JournalEntry, LineItem};
use crate::ports::LedgerTransaction;

/// A posted general ledger row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub id: LedgerRowId,
    pub organization_id: OrganizationId,
    pub account_id: AccountId,
    pub journal_entry_id: JournalEntryId,
    pub entry_number: String,
    pub transaction_date: NaiveDate,
    pub description: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
    /// The account's net balance after applying this row, fixed at write time
    pub running_balance: Decimal,
    pub fiscal_year: i32,
    /// 1-indexed month
    pub fiscal_period: u32,
    pub is_reconciled: bool,
    pub created_at: DateTime<Utc>,
    /// Tombstone; set by the store when the parent entry is voided
    pub deleted_at: Option<DateTime<Utc>>,
}

impl LedgerRow {
    /// Fiscal period the row is attributed to
    pub fn period(&self) -> FiscalPeriod {
        FiscalPeriod {
            year: self.fiscal_year,
            period: self.fiscal_period,
        }
    }
}

/// Filter for ledger row reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerRowQuery {
    pub account_id: Option<AccountId>,
    pub journal_entry_id: Option<JournalEntryId>,
    pub dates: DateRange,
}

impl LedgerRowQuery {
    /// Every active row of the organization
    pub fn all() -> Self {
        Self::default()
    }

    /// Rows of one account
    pub fn for_account(account_id: AccountId) -> Self {
        Self {
            account_id: Some(account_id),
            ..Self::default()
        }
    }

    /// Rows of one journal entry
    pub fn for_entry(journal_entry_id: JournalEntryId) -> Self {
        Self {
            journal_entry_id: Some(journal_entry_id),
            ..Self::default()
        }
    }

    /// Restricts to a date range
    pub fn within(mut self, dates: DateRange) -> Self {
        self.dates = dates;
        self
    }

    /// Returns true if the row passes the filter
    pub fn matches(&self, row: &LedgerRow) -> bool {
        self.account_id.map_or(true, |id| row.account_id == id)
            && self.journal_entry_id.map_or(true, |id| row.journal_entry_id == id)
            && self.dates.contains(row.transaction_date)
    }
}

/// Writes one ledger row for a line and updates its account
///
/// The running balance is taken from the account as it stands after the
/// delta, so lines of the same entry hitting one account chain correctly.
///
/// # Errors
///
/// Returns `NotFound` if the account does not exist, or a port error
pub async fn post_line(
    tx: &mut dyn LedgerTransaction,
    entry: &JournalEntry,
    line: &LineItem,
) -> Result<LedgerRow, LedgerError> {
    let mut account = tx
        .account(line.account_id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Account", line.account_id))?;

    account.apply_delta(line.debit, line.credit);
    tx.update_account(&account).await?;

    let period = FiscalPeriod::from_date(entry.entry_date);
    let row = LedgerRow {
        id: LedgerRowId::new(),
        organization_id: entry.organization_id,
        account_id: line.account_id,
        journal_entry_id: entry.id,
        entry_number: entry.entry_number.clone(),
        transaction_date: entry.entry_date,
        description: line.description.clone().or_else(|| Some(entry.description.clone())),
        debit: line.debit,
        credit: line.credit,
        running_balance: account.current_balance,
        fiscal_year: period.year,
        fiscal_period: period.period,
        is_reconciled: false,
        created_at: Utc::now(),
        deleted_at: None,
    };
    tx.insert_ledger_row(&row).await?;
    Ok(row)
}

/// Posts every line of an entry in order
pub async fn post_entry_lines(
    tx: &mut dyn LedgerTransaction,
    entry: &JournalEntry,
) -> Result<Vec<LedgerRow>, LedgerError> {
    let mut rows = Vec::with_capacity(entry.lines.len());
    for line in &entry.lines {
        rows.push(post_line(tx, entry, line).await?);
    }
    Ok(rows)
}

/// Reverses the account effect of every line of an entry and tombstones its rows
pub async fn unpost_entry_lines(
    tx: &mut dyn LedgerTransaction,
    entry: &JournalEntry,
) -> Result<(), LedgerError> {
    for line in &entry.lines {
        let mut account = tx
            .account(line.account_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Account", line.account_id))?;
        account.apply_delta(-line.debit, -line.credit);
        tx.update_account(&account).await?;
    }
    tx.tombstone_ledger_rows(entry.id, Utc::now()).await?;
    Ok(())
}

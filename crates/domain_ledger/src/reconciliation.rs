//! Reconciliation and recalculation
//!
//! The ledger rows are the source of truth; account balances are a derived
//! cache. [`audit`] compares the two without changing anything.
//! [`recalculate`] rebuilds the cache from the rows, but only when the
//! ledger itself is balanced.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use core_kernel::{within_tolerance, AccountId, JournalEntryId, LedgerRowId, OrganizationId};

use crate::account::Account;
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::journal::{line_totals, EntryStatus, JournalEntry};
use crate::ledger::{LedgerRow, LedgerRowQuery};
use crate::ports::LedgerTransaction;

/// Severity of a health finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Kind of health finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Trial balance debit and credit columns differ
    TrialBalanceUnbalanced,
    /// A posted entry's debits and credits differ
    UnbalancedEntry,
    /// An account's stored totals differ from its ledger rows
    BalanceMismatch,
    /// A ledger row points at a journal entry that no longer exists
    OrphanedEntry,
}

impl IssueKind {
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::TrialBalanceUnbalanced | IssueKind::UnbalancedEntry => Severity::High,
            IssueKind::BalanceMismatch => Severity::Medium,
            IssueKind::OrphanedEntry => Severity::Low,
        }
    }
}

/// One health finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    pub account_id: Option<AccountId>,
    pub journal_entry_id: Option<JournalEntryId>,
    pub ledger_row_id: Option<LedgerRowId>,
    /// Size of the discrepancy, when there is one
    pub difference: Option<Decimal>,
}

impl HealthIssue {
    fn new(kind: IssueKind, message: String) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message,
            account_id: None,
            journal_entry_id: None,
            ledger_row_id: None,
            difference: None,
        }
    }
}

/// Outcome of a health check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub organization_id: OrganizationId,
    pub is_healthy: bool,
    pub issues: Vec<HealthIssue>,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    /// Findings of one kind
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &HealthIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }
}

/// Debit and credit sums of ledger rows per account
pub fn ledger_totals_by_account(rows: &[LedgerRow]) -> HashMap<AccountId, (Decimal, Decimal)> {
    let mut totals: HashMap<AccountId, (Decimal, Decimal)> = HashMap::new();
    for row in rows {
        let slot = totals.entry(row.account_id).or_insert((Decimal::ZERO, Decimal::ZERO));
        slot.0 += row.debit;
        slot.1 += row.credit;
    }
    totals
}

/// Runs the four independent checks over active accounts, entries and rows
pub fn audit(
    accounts: &[Account],
    entries: &[JournalEntry],
    rows: &[LedgerRow],
    tolerance: Decimal,
) -> Vec<HealthIssue> {
    let mut issues = Vec::new();

    // 1. Trial balance over leaf accounts
    let (debits, credits) = accounts
        .iter()
        .filter(|a| !a.is_parent)
        .map(Account::trial_balance_columns)
        .fold((Decimal::ZERO, Decimal::ZERO), |(d, c), (dr, cr)| (d + dr, c + cr));
    if !within_tolerance(debits, credits, tolerance) {
        let mut issue = HealthIssue::new(
            IssueKind::TrialBalanceUnbalanced,
            format!(
                "Trial balance is out by {}: debits {} vs credits {}",
                (debits - credits).abs(),
                debits,
                credits
            ),
        );
        issue.difference = Some((debits - credits).abs());
        issues.push(issue);
    }

    // 2. Every posted entry balances, by its totals and by its lines
    for entry in entries.iter().filter(|e| e.status == EntryStatus::Posted) {
        let (line_debits, line_credits) = line_totals(&entry.lines);
        if !within_tolerance(entry.total_debit, entry.total_credit, tolerance)
            || !within_tolerance(line_debits, line_credits, tolerance)
        {
            let difference = (line_debits - line_credits).abs().max(entry.difference());
            let mut issue = HealthIssue::new(
                IssueKind::UnbalancedEntry,
                format!(
                    "Entry {} is unbalanced: debits {} vs credits {}",
                    entry.entry_number, line_debits, line_credits
                ),
            );
            issue.journal_entry_id = Some(entry.id);
            issue.difference = Some(difference);
            issues.push(issue);
        }
    }

    // 3. Stored account totals agree with the ledger
    let ledger = ledger_totals_by_account(rows);
    for account in accounts {
        let (debit, credit) = ledger
            .get(&account.id)
            .copied()
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));
        if !within_tolerance(debit, account.debit_balance, tolerance)
            || !within_tolerance(credit, account.credit_balance, tolerance)
        {
            let mut issue = HealthIssue::new(
                IssueKind::BalanceMismatch,
                format!(
                    "Account {} ({}) stores debits {} / credits {} but the ledger holds {} / {}",
                    account.code, account.name, account.debit_balance, account.credit_balance, debit, credit
                ),
            );
            issue.account_id = Some(account.id);
            issue.difference = Some(
                (account.current_balance - account.account_type.net_balance(debit, credit)).abs(),
            );
            issues.push(issue);
        }
    }

    // 4. Rows whose entry is gone
    let entry_ids: HashSet<JournalEntryId> = entries.iter().map(|e| e.id).collect();
    for row in rows.iter().filter(|r| !entry_ids.contains(&r.journal_entry_id)) {
        let mut issue = HealthIssue::new(
            IssueKind::OrphanedEntry,
            format!(
                "Ledger row {} references missing journal entry {}",
                row.id, row.journal_entry_id
            ),
        );
        issue.account_id = Some(row.account_id);
        issue.journal_entry_id = Some(row.journal_entry_id);
        issue.ledger_row_id = Some(row.id);
        issues.push(issue);
    }

    issues
}

/// Reads the books through the transaction and audits them
pub async fn health_check(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
) -> Result<HealthReport, LedgerError> {
    let accounts = tx.accounts().await?;
    let entries = tx.entries(None).await?;
    let rows = tx.ledger_rows(&LedgerRowQuery::all()).await?;

    let issues = audit(&accounts, &entries, &rows, config.balance_tolerance);
    for issue in &issues {
        tracing::warn!(kind = ?issue.kind, severity = ?issue.severity, "{}", issue.message);
    }
    Ok(HealthReport {
        organization_id: tx.organization_id(),
        is_healthy: issues.is_empty(),
        issues,
        checked_at: Utc::now(),
    })
}

/// Before and after totals of one recalculated account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceCorrection {
    pub account_id: AccountId,
    pub code: String,
    pub previous_debit: Decimal,
    pub previous_credit: Decimal,
    pub debit: Decimal,
    pub credit: Decimal,
}

/// Outcome of a recalculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecalculationReport {
    pub organization_id: OrganizationId,
    /// Accounts whose totals were rewritten
    pub accounts_recalculated: usize,
    /// Accounts whose totals actually changed
    pub corrections: Vec<BalanceCorrection>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub recalculated_at: DateTime<Utc>,
}

/// Rebuilds every account's totals from its active ledger rows
///
/// # Errors
///
/// `Corruption` if organization-wide ledger debits and credits differ; no
/// account is touched in that case
pub async fn recalculate(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
) -> Result<RecalculationReport, LedgerError> {
    let rows = tx.ledger_rows(&LedgerRowQuery::all()).await?;
    let total_debit = rows.iter().map(|r| r.debit).sum::<Decimal>();
    let total_credit = rows.iter().map(|r| r.credit).sum::<Decimal>();
    if !within_tolerance(total_debit, total_credit, config.balance_tolerance) {
        let difference = (total_debit - total_credit).abs();
        error!(
            organization_id = %tx.organization_id(),
            %total_debit,
            %total_credit,
            %difference,
            "Refusing to recalculate an unbalanced ledger"
        );
        return Err(LedgerError::Corruption {
            debits: total_debit,
            credits: total_credit,
            difference,
        });
    }

    let ledger = ledger_totals_by_account(&rows);
    let accounts = tx.accounts().await?;
    let mut corrections = Vec::new();
    for mut account in accounts.iter().cloned() {
        let (debit, credit) = ledger
            .get(&account.id)
            .copied()
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));
        if debit != account.debit_balance || credit != account.credit_balance {
            corrections.push(BalanceCorrection {
                account_id: account.id,
                code: account.code.clone(),
                previous_debit: account.debit_balance,
                previous_credit: account.credit_balance,
                debit,
                credit,
            });
        }
        account.set_balances(debit, credit);
        tx.update_account(&account).await?;
    }

    info!(
        organization_id = %tx.organization_id(),
        accounts = accounts.len(),
        corrected = corrections.len(),
        "Recalculated account balances"
    );
    Ok(RecalculationReport {
        organization_id: tx.organization_id(),
        accounts_recalculated: accounts.len(),
        corrections,
        total_debit,
        total_credit,
        recalculated_at: Utc::now(),
    })
}

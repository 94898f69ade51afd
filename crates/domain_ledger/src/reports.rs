//! Ledger reports
//!
//! Read-only views over accounts and ledger rows: trial balance, the
//! accounting equation, account statements and parent rollups.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{within_tolerance, AccountId, DateRange, OrganizationId};

use crate::account::{Account, AccountType};
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::ledger::{LedgerRow, LedgerRowQuery};
use crate::ports::LedgerTransaction;

/// One account's row on the trial balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalanceLine {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub debit: Decimal,
    pub credit: Decimal,
}

/// Trial balance over the leaf accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub organization_id: OrganizationId,
    pub lines: Vec<TrialBalanceLine>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub is_balanced: bool,
    pub generated_at: DateTime<Utc>,
}

impl TrialBalance {
    /// Builds the trial balance from accounts in chart order
    ///
    /// Parent accounts are left out; their balances are rollups of leaves
    /// already listed. Accounts with no balance are omitted.
    pub fn from_accounts(
        organization_id: OrganizationId,
        accounts: &[Account],
        tolerance: Decimal,
    ) -> Self {
        let lines: Vec<TrialBalanceLine> = accounts
            .iter()
            .filter(|a| !a.is_parent && !a.current_balance.is_zero())
            .map(|a| {
                let (debit, credit) = a.trial_balance_columns();
                TrialBalanceLine {
                    account_id: a.id,
                    code: a.code.clone(),
                    name: a.name.clone(),
                    account_type: a.account_type,
                    debit,
                    credit,
                }
            })
            .collect();
        let total_debit = lines.iter().map(|l| l.debit).sum::<Decimal>();
        let total_credit = lines.iter().map(|l| l.credit).sum::<Decimal>();
        Self {
            organization_id,
            lines,
            total_debit,
            total_credit,
            is_balanced: within_tolerance(total_debit, total_credit, tolerance),
            generated_at: Utc::now(),
        }
    }

    pub fn difference(&self) -> Decimal {
        (self.total_debit - self.total_credit).abs()
    }
}

/// Assets = Liabilities + Equity + (Revenue - Expenses)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountingEquation {
    pub assets: Decimal,
    pub liabilities: Decimal,
    pub equity: Decimal,
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub net_income: Decimal,
    pub is_balanced: bool,
}

impl AccountingEquation {
    /// Totals the leaf accounts of each type
    pub fn from_accounts(accounts: &[Account], tolerance: Decimal) -> Self {
        let total = |account_type: AccountType| -> Decimal {
            accounts
                .iter()
                .filter(|a| !a.is_parent && a.account_type == account_type)
                .map(|a| a.current_balance)
                .sum()
        };
        let assets = total(AccountType::Asset);
        let liabilities = total(AccountType::Liability);
        let equity = total(AccountType::Equity);
        let revenue = total(AccountType::Revenue);
        let expenses = total(AccountType::Expense);
        let net_income = revenue - expenses;
        Self {
            assets,
            liabilities,
            equity,
            revenue,
            expenses,
            net_income,
            is_balanced: within_tolerance(assets, liabilities + equity + net_income, tolerance),
        }
    }

    /// Right-hand side of the equation
    pub fn claims(&self) -> Decimal {
        self.liabilities + self.equity + self.net_income
    }
}

/// Ledger activity of one account over a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountStatement {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub dates: DateRange,
    /// Net balance of all rows dated before the range
    pub opening_balance: Decimal,
    pub rows: Vec<LedgerRow>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub closing_balance: Decimal,
}

impl AccountStatement {
    /// Splits an account's active rows into the opening balance and the rows
    /// that fall inside `dates`
    pub fn build(account: &Account, dates: DateRange, mut rows: Vec<LedgerRow>) -> Self {
        rows.sort_by(|a, b| {
            a.transaction_date
                .cmp(&b.transaction_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        let is_before = |date: NaiveDate| dates.start.is_some_and(|start| date < start);

        let (mut before_debit, mut before_credit) = (Decimal::ZERO, Decimal::ZERO);
        let mut in_range = Vec::new();
        for row in rows {
            if is_before(row.transaction_date) {
                before_debit += row.debit;
                before_credit += row.credit;
            } else if dates.contains(row.transaction_date) {
                in_range.push(row);
            }
        }

        let opening_balance = account.account_type.net_balance(before_debit, before_credit);
        let total_debit = in_range.iter().map(|r| r.debit).sum::<Decimal>();
        let total_credit = in_range.iter().map(|r| r.credit).sum::<Decimal>();
        let closing_balance =
            opening_balance + account.account_type.net_balance(total_debit, total_credit);
        Self {
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            account_type: account.account_type,
            dates,
            opening_balance,
            rows: in_range,
            total_debit,
            total_credit,
            closing_balance,
        }
    }
}

/// Sums the balances of the leaf accounts below `root`
///
/// A leaf root returns its own balance. Each account is visited once, so a
/// cycle in the parent links cannot loop.
pub fn rollup_balance(accounts: &[Account], root: AccountId) -> Decimal {
    let mut total = Decimal::ZERO;
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        let Some(account) = accounts.iter().find(|a| a.id == id) else {
            continue;
        };
        if !account.is_parent {
            total += account.current_balance;
        }
        queue.extend(
            accounts
                .iter()
                .filter(|a| a.parent_id == Some(id))
                .map(|a| a.id),
        );
    }
    total
}

pub async fn trial_balance(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
) -> Result<TrialBalance, LedgerError> {
    let accounts = tx.accounts().await?;
    Ok(TrialBalance::from_accounts(
        tx.organization_id(),
        &accounts,
        config.balance_tolerance,
    ))
}

pub async fn accounting_equation(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
) -> Result<AccountingEquation, LedgerError> {
    let accounts = tx.accounts().await?;
    Ok(AccountingEquation::from_accounts(&accounts, config.balance_tolerance))
}

pub async fn account_statement(
    tx: &mut dyn LedgerTransaction,
    account_id: AccountId,
    dates: DateRange,
) -> Result<AccountStatement, LedgerError> {
    let account = tx
        .account(account_id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Account", account_id))?;
    let rows = tx.ledger_rows(&LedgerRowQuery::for_account(account_id)).await?;
    Ok(AccountStatement::build(&account, dates, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{JournalEntryId, LedgerRowId, BALANCE_TOLERANCE};
    use rust_decimal_macros::dec;

    fn account(code: &str, account_type: AccountType, debit: Decimal, credit: Decimal) -> Account {
        let mut account = Account::new(OrganizationId::new(), code, code, account_type);
        account.apply_delta(debit, credit);
        account
    }

    fn row(account: &Account, date: NaiveDate, debit: Decimal, credit: Decimal) -> LedgerRow {
        LedgerRow {
            id: LedgerRowId::new(),
            organization_id: account.organization_id,
            account_id: account.id,
            journal_entry_id: JournalEntryId::new(),
            entry_number: "JE-000001".to_string(),
            transaction_date: date,
            description: None,
            debit,
            credit,
            running_balance: Decimal::ZERO,
            fiscal_year: 2024,
            fiscal_period: 1,
            is_reconciled: false,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    #[test]
    fn test_trial_balance_columns() {
        let accounts = vec![
            account("1000", AccountType::Asset, dec!(500), Decimal::ZERO),
            account("3000", AccountType::Equity, Decimal::ZERO, dec!(400)),
            account("4000", AccountType::Revenue, Decimal::ZERO, dec!(100)),
        ];
        let report = TrialBalance::from_accounts(OrganizationId::new(), &accounts, BALANCE_TOLERANCE);
        assert_eq!(report.lines.len(), 3);
        assert_eq!(report.total_debit, dec!(500));
        assert_eq!(report.total_credit, dec!(500));
        assert!(report.is_balanced);
    }

    #[test]
    fn test_accounting_equation() {
        let accounts = vec![
            account("1000", AccountType::Asset, dec!(1100), Decimal::ZERO),
            account("2100", AccountType::Liability, Decimal::ZERO, dec!(100)),
            account("4000", AccountType::Revenue, Decimal::ZERO, dec!(1200)),
            account("6000", AccountType::Expense, dec!(200), Decimal::ZERO),
        ];
        let equation = AccountingEquation::from_accounts(&accounts, BALANCE_TOLERANCE);
        assert_eq!(equation.net_income, dec!(1000));
        assert_eq!(equation.claims(), dec!(1100));
        assert!(equation.is_balanced);
    }

    #[test]
    fn test_statement_opening_and_closing() {
        let cash = account("1000", AccountType::Asset, dec!(180), dec!(20));
        let rows = vec![
            row(&cash, date(1, 5), dec!(100), Decimal::ZERO),
            row(&cash, date(2, 3), dec!(80), Decimal::ZERO),
            row(&cash, date(2, 20), Decimal::ZERO, dec!(20)),
        ];
        let february = DateRange::between(date(2, 1), date(2, 29)).unwrap();
        let statement = AccountStatement::build(&cash, february, rows);
        assert_eq!(statement.opening_balance, dec!(100));
        assert_eq!(statement.rows.len(), 2);
        assert_eq!(statement.closing_balance, dec!(160));
    }

    #[test]
    fn test_rollup_sums_leaf_descendants() {
        let org = OrganizationId::new();
        let parent = Account::new(org, "1000", "Current Assets", AccountType::Asset).as_parent();
        let child_group = Account::new(org, "1100", "Bank", AccountType::Asset)
            .with_parent(parent.id)
            .as_parent();
        let mut checking = Account::new(org, "1110", "Checking", AccountType::Asset).with_parent(child_group.id);
        checking.apply_delta(dec!(300), Decimal::ZERO);
        let mut petty = Account::new(org, "1010", "Petty Cash", AccountType::Asset).with_parent(parent.id);
        petty.apply_delta(dec!(25), Decimal::ZERO);

        let root = parent.id;
        let accounts = vec![parent, child_group, checking, petty];
        assert_eq!(rollup_balance(&accounts, root), dec!(325));
    }
}

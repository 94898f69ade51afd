//! Custom Test Assertions
//!
//! Assertion helpers for ledger types with messages that name the account
//! or entry involved.

use std::collections::HashMap;

use core_kernel::{AccountId, BALANCE_TOLERANCE};
use domain_ledger::{Account, JournalEntry, LedgerRow};
use rust_decimal::Decimal;

/// Asserts two amounts are equal, ignoring scale (100 == 100.00)
pub fn assert_amount_eq(actual: Decimal, expected: Decimal) {
    assert!(
        actual.normalize() == expected.normalize(),
        "Amounts differ: actual={}, expected={}",
        actual,
        expected
    );
}

/// Asserts an entry's stored totals match its lines and balance
pub fn assert_entry_balanced(entry: &JournalEntry) {
    let debits: Decimal = entry.lines.iter().map(|l| l.debit).sum();
    let credits: Decimal = entry.lines.iter().map(|l| l.credit).sum();
    assert_amount_eq(entry.total_debit, debits);
    assert_amount_eq(entry.total_credit, credits);
    assert!(
        (debits - credits).abs() < BALANCE_TOLERANCE,
        "Entry {} is unbalanced: debits={}, credits={}",
        entry.entry_number,
        debits,
        credits
    );
    assert!(entry.is_balanced, "Entry {} is not flagged balanced", entry.entry_number);
}

/// Asserts an account's running debit, credit and net balance
pub fn assert_account_balance(account: &Account, debit: Decimal, credit: Decimal, current: Decimal) {
    assert!(
        account.debit_balance.normalize() == debit.normalize()
            && account.credit_balance.normalize() == credit.normalize()
            && account.current_balance.normalize() == current.normalize(),
        "Account {} ({}) balances: debit={}, credit={}, current={}; expected debit={}, credit={}, current={}",
        account.code,
        account.name,
        account.debit_balance,
        account.credit_balance,
        account.current_balance,
        debit,
        credit,
        current
    );
}

/// Asserts every account's running totals equal the sums of its active ledger rows
pub fn assert_accounts_match_ledger(accounts: &[Account], rows: &[LedgerRow]) {
    let mut totals: HashMap<AccountId, (Decimal, Decimal)> = HashMap::new();
    for row in rows.iter().filter(|r| r.deleted_at.is_none()) {
        let entry = totals.entry(row.account_id).or_default();
        entry.0 += row.debit;
        entry.1 += row.credit;
    }

    for account in accounts.iter().filter(|a| a.deleted_at.is_none()) {
        let (debit, credit) = totals.get(&account.id).copied().unwrap_or_default();
        assert!(
            account.debit_balance.normalize() == debit.normalize()
                && account.credit_balance.normalize() == credit.normalize(),
            "Account {} drifted from the ledger: running debit={}, credit={}; ledger debit={}, credit={}",
            account.code,
            account.debit_balance,
            account.credit_balance,
            debit,
            credit
        );
    }
}

/// Asserts total debits equal total credits across active ledger rows
pub fn assert_ledger_balanced(rows: &[LedgerRow]) {
    let active = rows.iter().filter(|r| r.deleted_at.is_none());
    let (debits, credits) = active.fold((Decimal::ZERO, Decimal::ZERO), |(d, c), r| (d + r.debit, c + r.credit));
    assert!(
        (debits - credits).abs() < BALANCE_TOLERANCE,
        "Ledger out of balance: debits={}, credits={}",
        debits,
        credits
    );
}

/// Asserts that a Result is an error containing a specific message
pub fn assert_error_contains<T: std::fmt::Debug, E: std::fmt::Display>(result: &Result<T, E>, expected: &str) {
    match result {
        Ok(v) => panic!("Expected error containing '{}', got Ok({:?})", expected, v),
        Err(e) => {
            let message = e.to_string();
            assert!(
                message.contains(expected),
                "Error message '{}' does not contain '{}'",
                message,
                expected
            );
        }
    }
}

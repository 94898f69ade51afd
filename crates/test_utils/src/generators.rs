//! Property-Based Test Generators
//!
//! Proptest strategies for amounts, quantities and line items. Line strategies
//! pick accounts by index so callers can map them onto a real chart.

use core_kernel::AccountId;
use domain_ledger::LineItem;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Positive amounts with two decimal places, 0.01 to 100,000.00
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Whole quantities for stock movements
pub fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..500i64).prop_map(Decimal::from)
}

/// A transfer between two distinct account indexes below `accounts`
pub fn transfer_strategy(accounts: usize) -> impl Strategy<Value = (usize, usize, Decimal)> {
    (0..accounts, 1..accounts, amount_strategy())
        .prop_map(move |(debit, offset, amount)| (debit, (debit + offset) % accounts, amount))
}

/// Balanced line sets over the given accounts
///
/// Each set is one to four transfers; a transfer may be split so that one
/// debit is matched by two credits.
pub fn balanced_lines_strategy(accounts: Vec<AccountId>) -> impl Strategy<Value = Vec<LineItem>> {
    let n = accounts.len();
    prop::collection::vec((transfer_strategy(n), any::<bool>(), 0..n), 1..5).prop_map(move |transfers| {
        let mut lines = Vec::new();
        for ((debit, credit, amount), split, third) in transfers {
            lines.push(LineItem::debit(accounts[debit], amount));
            let half = (amount / Decimal::TWO).round_dp(2);
            if split && half > Decimal::ZERO && half < amount {
                lines.push(LineItem::credit(accounts[credit], half));
                lines.push(LineItem::credit(accounts[third], amount - half));
            } else {
                lines.push(LineItem::credit(accounts[credit], amount));
            }
        }
        lines
    })
}

/// Line sets whose debits exceed credits by at least one cent
pub fn unbalanced_lines_strategy(accounts: Vec<AccountId>) -> impl Strategy<Value = Vec<LineItem>> {
    (balanced_lines_strategy(accounts.clone()), amount_strategy(), 0..accounts.len()).prop_map(
        move |(mut lines, excess, index)| {
            lines.push(LineItem::debit(accounts[index], excess));
            lines
        },
    )
}

//! Monetary amount helpers
//!
//! All ledger amounts are `rust_decimal::Decimal` values in the organization's
//! single bookkeeping currency. This module holds the shared tolerance used for
//! balance comparisons and the rounding rule applied to derived amounts.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use thiserror::Error;

/// Two amounts closer than this are considered equal for balance checks
pub const BALANCE_TOLERANCE: Decimal = dec!(0.01);

/// Number of decimal places stored for derived amounts
pub const AMOUNT_SCALE: u32 = 2;

/// Errors raised when validating monetary input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("{field} must not be negative (got {amount})")]
    Negative { field: String, amount: Decimal },

    #[error("{field} must be greater than zero")]
    NotPositive { field: String },

    #[error("{field} {amount} has fractions of a cent")]
    TooPrecise { field: String, amount: Decimal },

    #[error("Invalid amount: {0}")]
    Invalid(String),
}

/// Rounds an amount to the stored scale, half away from zero
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns true if `a` and `b` differ by less than `tolerance`
pub fn within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() < tolerance
}

/// Sums an iterator of amounts
pub fn sum_amounts<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().fold(Decimal::ZERO, |acc, amount| acc + amount)
}

/// Rejects negative amounts
pub fn ensure_non_negative(amount: Decimal, field: &str) -> Result<Decimal, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative {
            field: field.to_string(),
            amount,
        });
    }
    Ok(amount)
}

/// Rejects zero and negative amounts
pub fn ensure_positive(amount: Decimal, field: &str) -> Result<Decimal, AmountError> {
    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive {
            field: field.to_string(),
        });
    }
    Ok(amount)
}

/// Rejects amounts with fractions of a cent
///
/// Ledger amounts are whole cents, so any two balanced sums are exactly equal.
pub fn ensure_cents(amount: Decimal, field: &str) -> Result<Decimal, AmountError> {
    if round_amount(amount) != amount {
        return Err(AmountError::TooPrecise {
            field: field.to_string(),
            amount,
        });
    }
    Ok(amount)
}

/// Parses a user-supplied amount string such as "1100.00"
pub fn parse_amount(input: &str) -> Result<Decimal, AmountError> {
    input
        .trim()
        .parse::<Decimal>()
        .map_err(|e| AmountError::Invalid(format!("{}: {}", input, e)))
}

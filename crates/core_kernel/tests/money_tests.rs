//! Unit tests for amount helpers

use core_kernel::money::{
    ensure_non_negative, ensure_positive, parse_amount, round_amount, sum_amounts,
    within_tolerance, AmountError, BALANCE_TOLERANCE,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn test_tolerance_is_one_cent() {
    assert_eq!(BALANCE_TOLERANCE, dec!(0.01));
}

#[test]
fn test_within_tolerance_is_strict() {
    assert!(within_tolerance(dec!(1100), dec!(1100), BALANCE_TOLERANCE));
    assert!(within_tolerance(dec!(1100), dec!(1099.995), BALANCE_TOLERANCE));
    assert!(!within_tolerance(dec!(1100), dec!(1099.99), BALANCE_TOLERANCE));
}

#[test]
fn test_round_amount_half_away_from_zero() {
    assert_eq!(round_amount(dec!(0.125)), dec!(0.13));
    assert_eq!(round_amount(dec!(0.135)), dec!(0.14));
    assert_eq!(round_amount(dec!(-0.125)), dec!(-0.13));
}

#[test]
fn test_sum_amounts() {
    let total = sum_amounts([dec!(1000), dec!(100), dec!(0.5)]);
    assert_eq!(total, dec!(1100.5));
}

#[test]
fn test_ensure_positive() {
    assert_eq!(ensure_positive(dec!(5), "quantity").unwrap(), dec!(5));
    assert_eq!(
        ensure_positive(Decimal::ZERO, "quantity"),
        Err(AmountError::NotPositive { field: "quantity".to_string() })
    );
}

#[test]
fn test_ensure_non_negative_accepts_zero() {
    assert_eq!(ensure_non_negative(Decimal::ZERO, "credit").unwrap(), Decimal::ZERO);
    assert!(ensure_non_negative(dec!(-0.01), "credit").is_err());
}

#[test]
fn test_parse_amount() {
    assert_eq!(parse_amount("42.10").unwrap(), dec!(42.10));
    assert!(matches!(parse_amount(""), Err(AmountError::Invalid(_))));
}

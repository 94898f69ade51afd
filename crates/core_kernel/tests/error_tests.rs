//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::money::{ensure_positive, AmountError};
use core_kernel::temporal::FiscalPeriod;

#[test]
fn test_validation_message_is_kept() {
    let error = CoreError::validation("Line items must not be empty");
    assert!(matches!(&error, CoreError::Validation(msg) if msg == "Line items must not be empty"));
    assert_eq!(error.to_string(), "Invalid input: Line items must not be empty");
}

#[test]
fn test_configuration_error_display() {
    let error = CoreError::configuration("balance tolerance must be positive");
    assert!(error.to_string().starts_with("Invalid configuration"));
}

#[test]
fn test_amount_error_converts_transparently() {
    let amount_error = ensure_positive(rust_decimal::Decimal::ZERO, "amount").unwrap_err();
    assert!(matches!(amount_error, AmountError::NotPositive { .. }));
    let expected = amount_error.to_string();

    let core_error: CoreError = amount_error.into();
    assert!(matches!(core_error, CoreError::Amount(_)));
    assert_eq!(core_error.to_string(), expected);
}

#[test]
fn test_temporal_error_converts() {
    let core_error: CoreError = FiscalPeriod::new(2024, 13).unwrap_err().into();
    assert!(matches!(core_error, CoreError::Temporal(_)));
    assert!(core_error.to_string().contains("13"));
}

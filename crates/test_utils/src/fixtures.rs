//! Pre-built Test Fixtures
//!
//! Predictable dates, amounts, identifiers and document numbers for ledger
//! tests. Everything lands in fiscal year 2024.

use chrono::NaiveDate;
use core_kernel::{AccountId, FiscalPeriod, OrganizationId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fixture for amounts used across scenarios
pub struct AmountFixtures;

impl AmountFixtures {
    /// Standard invoice subtotal
    pub fn subtotal() -> Decimal {
        dec!(1000.00)
    }

    /// Tax on the standard subtotal
    pub fn tax() -> Decimal {
        dec!(100.00)
    }

    /// Subtotal plus tax
    pub fn total() -> Decimal {
        dec!(1100.00)
    }

    /// Product cost price
    pub fn unit_cost() -> Decimal {
        dec!(5.00)
    }

    /// Product selling price
    pub fn unit_price() -> Decimal {
        dec!(12.50)
    }
}

/// Fixture for dates
pub struct DateFixtures;

impl DateFixtures {
    /// Start of the fiscal year
    pub fn year_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    /// A mid-January posting date
    pub fn posting_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    /// A date in the following month
    pub fn next_month() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()
    }

    /// Month end, used for depreciation
    pub fn month_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    /// End of the fiscal year
    pub fn year_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
    }

    /// January 2024
    pub fn january() -> FiscalPeriod {
        FiscalPeriod::from_date(Self::posting_date())
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    /// Creates a fresh organization ID
    pub fn organization_id() -> OrganizationId {
        OrganizationId::new()
    }

    /// Creates a fresh account ID
    pub fn account_id() -> AccountId {
        AccountId::new()
    }
}

/// Fixture for document numbers
pub struct NumberFixtures;

impl NumberFixtures {
    pub fn invoice(n: u32) -> String {
        format!("INV-{:04}", n)
    }

    pub fn payment(n: u32) -> String {
        format!("PAY-{:04}", n)
    }

    pub fn bill(n: u32) -> String {
        format!("BILL-{:04}", n)
    }

    pub fn bill_payment(n: u32) -> String {
        format!("BP-{:04}", n)
    }

    pub fn adjustment(n: u32) -> String {
        format!("ADJ-{:04}", n)
    }

    pub fn sku(n: u32) -> String {
        format!("SKU-{:03}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_subtotal_plus_tax() {
        assert_eq!(AmountFixtures::subtotal() + AmountFixtures::tax(), AmountFixtures::total());
    }

    #[test]
    fn test_dates_fall_in_2024() {
        assert_eq!(DateFixtures::january(), FiscalPeriod { year: 2024, period: 1 });
        assert!(DateFixtures::year_start() < DateFixtures::year_end());
    }

    #[test]
    fn test_numbers_are_zero_padded() {
        assert_eq!(NumberFixtures::invoice(7), "INV-0007");
        assert_eq!(NumberFixtures::sku(3), "SKU-003");
    }
}

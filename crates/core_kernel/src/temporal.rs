//! Fiscal calendar types
//!
//! Ledger rows are attributed to a fiscal year and a 1-indexed fiscal period.
//! The fiscal year follows the calendar year and each period is one month.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by fiscal calendar operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid fiscal period {period} (expected 1-12)")]
    InvalidPeriod { period: u32 },

    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: String, end: String },
}

/// A month-sized accounting bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FiscalPeriod {
    /// Calendar year of the period
    pub year: i32,
    /// Month of the year, 1-indexed
    pub period: u32,
}

impl FiscalPeriod {
    /// Creates a fiscal period, validating the month number
    pub fn new(year: i32, period: u32) -> Result<Self, TemporalError> {
        if !(1..=12).contains(&period) {
            return Err(TemporalError::InvalidPeriod { period });
        }
        Ok(Self { year, period })
    }

    /// Derives the fiscal period a transaction date belongs to
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            period: date.month(),
        }
    }

    /// First day of the period
    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.period, 1)
    }

    /// Last day of the period
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.next().start_date().and_then(|d| d.pred_opt())
    }

    /// The period immediately after this one
    pub fn next(&self) -> Self {
        if self.period == 12 {
            Self { year: self.year + 1, period: 1 }
        } else {
            Self { year: self.year, period: self.period + 1 }
        }
    }

    /// Returns true if the date falls inside this period
    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::from_date(date) == *self
    }
}

impl fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.period)
    }
}

/// An inclusive date range used to filter ledger queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// A range that matches every date
    pub fn unbounded() -> Self {
        Self { start: None, end: None }
    }

    /// A bounded range; fails if start is after end
    pub fn between(start: NaiveDate, end: NaiveDate) -> Result<Self, TemporalError> {
        if start > end {
            return Err(TemporalError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start: Some(start), end: Some(end) })
    }

    /// The range covering one fiscal period
    pub fn for_period(period: FiscalPeriod) -> Self {
        Self {
            start: period.start_date(),
            end: period.end_date(),
        }
    }

    /// Returns true if the date is inside the range
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_from_date() {
        let period = FiscalPeriod::from_date(date(2024, 3, 15));
        assert_eq!(period.year, 2024);
        assert_eq!(period.period, 3);
        assert_eq!(period.to_string(), "2024-03");
    }

    #[test]
    fn test_invalid_period() {
        assert!(FiscalPeriod::new(2024, 0).is_err());
        assert!(FiscalPeriod::new(2024, 13).is_err());
    }

    #[test]
    fn test_period_bounds() {
        let feb = FiscalPeriod::new(2024, 2).unwrap();
        assert_eq!(feb.start_date(), Some(date(2024, 2, 1)));
        assert_eq!(feb.end_date(), Some(date(2024, 2, 29)));

        let dec = FiscalPeriod::new(2023, 12).unwrap();
        assert_eq!(dec.next(), FiscalPeriod::new(2024, 1).unwrap());
        assert_eq!(dec.end_date(), Some(date(2023, 12, 31)));
    }

    #[test]
    fn test_date_range() {
        let range = DateRange::between(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        assert!(range.contains(date(2024, 1, 31)));
        assert!(!range.contains(date(2024, 2, 1)));
        assert!(DateRange::unbounded().contains(date(1999, 1, 1)));
        assert!(DateRange::between(date(2024, 2, 1), date(2024, 1, 1)).is_err());
    }
}

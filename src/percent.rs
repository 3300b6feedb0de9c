//! Exact percentage type for cashback.
//!
//! Uses `rust_decimal` so that `floor(amount * pct / 100)` is computed
//! without binary floating-point error (5% of 300 is exactly 15).

use crate::error::{LedgerError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// A non-negative percentage, e.g. `5` or `2.5`.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use temporal_ledger::Percentage;
///
/// let pct = Percentage::from_str("5").unwrap();
/// assert_eq!(pct.cashback_on(300), Some(15));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Percentage(Decimal);

impl Percentage {
    pub const ZERO: Self = Percentage(Decimal::ZERO);

    /// Wraps `value`, rejecting negatives.
    pub fn new(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(LedgerError::InvalidPercentage(value.to_string()));
        }
        Ok(Percentage(value.normalize()))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// `floor(amount * self / 100)`, or `None` if the result does not fit in `i64`.
    pub fn cashback_on(&self, amount: i64) -> Option<i64> {
        Decimal::from(amount)
            .checked_mul(self.0)?
            .checked_div(Decimal::ONE_HUNDRED)?
            .floor()
            .to_i64()
    }
}

impl FromStr for Percentage {
    type Err = LedgerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed)
            .map_err(|_| LedgerError::InvalidPercentage(trimmed.to_string()))?;
        Percentage::new(decimal)
    }
}

impl TryFrom<f64> for Percentage {
    type Error = LedgerError;

    fn try_from(value: f64) -> std::result::Result<Self, Self::Error> {
        let decimal = Decimal::try_from(value)
            .map_err(|_| LedgerError::InvalidPercentage(value.to_string()))?;
        Percentage::new(decimal)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

//! Amount type for handling the monetary values reported by the datalake.
//!
//! This module provides the `Amount` type which wraps `Decimal`. Upstream
//! `valor` fields are decimal strings, but the feeds are messy: empty strings
//! and non-numeric garbage occur and must be treated as zero rather than
//! failing a whole record (see `parse_lenient`).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// Represents a revenue amount in BRL.
///
/// This type wraps `Decimal` so sums over many records are exact (no float
/// drift across a year of monthly figures).
///
/// # Examples
///
/// Lenient parsing never fails:
/// ```
/// # use icms_sync::model::Amount;
/// assert_eq!(Amount::parse_lenient("1500.25").to_plain_string(), "1500.25");
/// assert!(Amount::parse_lenient("").is_zero());
/// assert!(Amount::parse_lenient("n/a").is_zero());
/// ```
///
/// Display is currency-formatted:
/// ```
/// # use icms_sync::model::Amount;
/// assert_eq!(Amount::parse_lenient("1234567.5").to_string(), "R$ 1,234,567.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parses an amount, coercing anything unparseable (including the empty
    /// string) to zero. Upstream rows occasionally carry blank `valor` fields
    /// and the pipeline must not reject the record for it.
    pub fn parse_lenient(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Amount::default();
        }
        Decimal::from_str(trimmed)
            .map(Amount::new)
            .unwrap_or_default()
    }

    /// The absolute difference between two amounts, used for the per-month
    /// reconciliation delta.
    pub fn abs_diff(&self, other: &Amount) -> Amount {
        Amount::new((self.0 - other.0).abs())
    }

    /// The plain decimal rendering without currency formatting, e.g. `1500.25`.
    pub fn to_plain_string(&self) -> String {
        self.0.to_string()
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount::new(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 += rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::default(), Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, num) = if self.0.is_sign_negative() && !self.is_zero() {
            ("-", self.0.abs())
        } else {
            ("", self.0)
        };
        write!(
            f,
            "{sign}R$ {}",
            format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
        )
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Serialize as the plain decimal string, the same shape the CSV holds.
        serializer.serialize_str(&self.to_plain_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Amount::parse_lenient(&s))
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let amount = Amount::parse_lenient("1500.25");
        assert_eq!(amount.value(), Decimal::from_str("1500.25").unwrap());
    }

    #[test]
    fn test_parse_negative() {
        let amount = Amount::parse_lenient("-42.10");
        assert_eq!(amount.value(), Decimal::from_str("-42.10").unwrap());
    }

    #[test]
    fn test_parse_empty_is_zero() {
        assert!(Amount::parse_lenient("").is_zero());
        assert!(Amount::parse_lenient("   ").is_zero());
    }

    #[test]
    fn test_parse_garbage_is_zero() {
        assert!(Amount::parse_lenient("abc").is_zero());
        assert!(Amount::parse_lenient("12,34").is_zero());
    }

    #[test]
    fn test_sum_is_exact() {
        let total: Amount = ["0.1", "0.2", "0.3"]
            .iter()
            .map(|s| Amount::parse_lenient(s))
            .sum();
        assert_eq!(total.to_plain_string(), "0.6");
    }

    #[test]
    fn test_abs_diff() {
        let a = Amount::parse_lenient("100");
        let b = Amount::parse_lenient("250.5");
        assert_eq!(a.abs_diff(&b).to_plain_string(), "150.5");
        assert_eq!(b.abs_diff(&a).to_plain_string(), "150.5");
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::parse_lenient("0").to_string(), "R$ 0.00");
        assert_eq!(
            Amount::parse_lenient("-1234.5").to_string(),
            "-R$ 1,234.50"
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let amount = Amount::parse_lenient("987.65");
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"987.65\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(amount, back);
    }
}

//! Money helpers - rounding, fixed order charges, and naira formatting.
//!
//! All monetary values in the core are `Decimal`. The datastore keeps prices as
//! `REAL` columns, so values crossing that boundary go through [`to_decimal`] and
//! [`to_f64`].

use crate::errors::{Error, Result};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso};
use std::fmt;

/// Flat packaging fee added once to every order.
pub const PACKAGING_FEE: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Share of an order's final total credited to the referring affiliate (10%).
pub const REFERRAL_COMMISSION_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Rounds to two decimal places, halves away from zero.
#[must_use]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a stored `REAL` amount into a two-place `Decimal`.
///
/// # Errors
/// Returns `Error::InvalidAmount` for NaN or infinite values.
pub fn to_decimal(amount: f64) -> Result<Decimal> {
    Decimal::from_f64(amount)
        .map(round2)
        .ok_or(Error::InvalidAmount { amount })
}

/// Converts a `Decimal` back into the `REAL` representation used by the datastore.
///
/// # Errors
/// Returns `Error::Validation` if the value cannot be represented as `f64`.
pub fn to_f64(amount: Decimal) -> Result<f64> {
    amount
        .to_f64()
        .ok_or_else(|| Error::validation(format!("Amount {amount} is out of range")))
}

/// Display wrapper rendering an amount as naira with two fraction digits,
/// e.g. `₦12,250.50`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Naira(pub Decimal);

impl From<Decimal> for Naira {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<&Decimal> for Naira {
    fn from(value: &Decimal) -> Self {
        Self(*value)
    }
}

impl fmt::Display for Naira {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = round2(self.0);
        match rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|minor| minor.to_i64())
        {
            Some(minor) => write!(f, "{}", Money::from_minor(minor, iso::NGN)),
            None => write!(f, "{}{rounded:.2}", iso::NGN.symbol),
        }
    }
}

/// Formats an amount for display.
#[must_use]
pub fn format_naira(amount: Decimal) -> String {
    Naira(amount).to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_round2_rounds_half_away_from_zero() {
        assert_eq!(round2(Decimal::new(10_005, 3)), Decimal::new(1_001, 2));
        assert_eq!(round2(Decimal::new(10_015, 3)), Decimal::new(1_002, 2));
        assert_eq!(round2(Decimal::new(1_234, 2)), Decimal::new(1_234, 2));
    }

    #[test]
    fn test_constants() {
        assert_eq!(PACKAGING_FEE, Decimal::new(10_000, 0));
        assert_eq!(REFERRAL_COMMISSION_RATE, Decimal::new(1, 1));
    }

    #[test]
    fn test_to_decimal_round_trip() {
        assert_eq!(to_decimal(1250.5).unwrap(), Decimal::new(125_050, 2));
        assert_eq!(to_f64(Decimal::new(125_050, 2)).unwrap(), 1250.5);
        assert!(matches!(
            to_decimal(f64::NAN),
            Err(Error::InvalidAmount { .. })
        ));
        assert!(to_decimal(f64::INFINITY).is_err());
    }

    #[test]
    fn test_format_naira() {
        let text = format_naira(Decimal::new(1_225_050, 2));
        assert!(text.starts_with('₦'), "unexpected format: {text}");
        assert!(text.ends_with("12,250.50"), "unexpected format: {text}");

        let text = format_naira(Decimal::new(5, 1));
        assert!(text.ends_with("0.50"), "unexpected format: {text}");
    }

    #[test]
    fn test_format_naira_beyond_minor_units() {
        let text = format_naira(Decimal::MAX);
        assert!(text.starts_with('₦'), "unexpected format: {text}");
        assert!(text.ends_with(".00"), "unexpected format: {text}");

        let huge = Decimal::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0);
        assert!(format_naira(huge).contains("50000000000000000000000000000"));
    }
}

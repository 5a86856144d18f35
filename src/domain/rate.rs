//! Lossless payout rates backed by rust_decimal.
//!
//! Rates are held as fractions (0.6 for 60%). Applying a rate to a minor-unit
//! amount rounds half away from zero, so `Rate::from_percent(60)` applied to
//! 20000 cents yields exactly 12000.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A payout rate expressed as a fraction of an amount.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Rate(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Rate {
    /// Build a rate from a percentage (60 => 0.6).
    pub fn from_percent(percent: Decimal) -> Self {
        Rate(percent / Decimal::ONE_HUNDRED)
    }

    /// Build a rate from a fraction (0.2 => 20%).
    pub fn from_fraction(fraction: Decimal) -> Self {
        Rate(fraction)
    }

    /// Parse a percentage string such as "60" or "12.5".
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn parse_percent(s: &str) -> Result<Self, rust_decimal::Error> {
        Decimal::from_str(s.trim()).map(Self::from_percent)
    }

    /// Parse a fraction string such as "0.20".
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn parse_fraction(s: &str) -> Result<Self, rust_decimal::Error> {
        Decimal::from_str(s.trim()).map(Rate)
    }

    pub fn zero() -> Self {
        Rate(Decimal::ZERO)
    }

    /// `1 - self`; the share left over after this rate is taken.
    pub fn complement(&self) -> Self {
        Rate(Decimal::ONE - self.0)
    }

    pub fn as_fraction(&self) -> Decimal {
        self.0
    }

    /// The rate as a percentage, normalized ("60", "12.5").
    pub fn to_percent_string(&self) -> String {
        (self.0 * Decimal::ONE_HUNDRED).normalize().to_string()
    }

    /// Apply the rate to a minor-unit amount, rounding to the nearest unit.
    pub fn apply(&self, amount: i64) -> i64 {
        round_minor(Decimal::from(amount) * self.0)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.to_percent_string())
    }
}

/// Round a decimal amount of minor units to an integer, half away from zero.
///
/// Saturates at the i64 bounds; ledger amounts never approach them.
pub fn round_minor(value: Decimal) -> i64 {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

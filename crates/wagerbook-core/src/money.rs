//! Fixed-point money.
//!
//! Balances, stakes and payouts are held as integer hundredths so settlement
//! arithmetic never accumulates floating-point drift. JSON carries the value as
//! a decimal number, matching what clients of the service expect.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Hundredths per whole money unit.
pub const CENTS_PER_UNIT: i64 = 100;

/// An amount of money in hundredths of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, sqlx::Type)]
#[sqlx(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Self = Self(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn from_units(units: i64) -> Self {
        Self(units.saturating_mul(CENTS_PER_UNIT))
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Whole units, truncating any fractional part.
    pub const fn whole_units(self) -> i64 {
        self.0 / CENTS_PER_UNIT
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / CENTS_PER_UNIT as f64
    }

    /// Round a decimal amount to the nearest hundredth.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f64(value: f64) -> Self {
        Self((value * 100.0).round() as i64)
    }

    /// Payout for a winning stake of `stake_units` at `odds`, rounded to the
    /// nearest hundredth.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn payout(stake_units: i64, odds: f64) -> Self {
        let cents = (stake_units.saturating_mul(CENTS_PER_UNIT) as f64 * odds).round();
        Self(cents as i64)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Self::from_f64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn payout_at_even_odds() {
        assert_eq!(Money::payout(1000, 2.0), Money::from_units(2000));
    }

    #[test]
    fn payout_rounds_to_cents() {
        // 3 * 1.233 = 3.699
        assert_eq!(Money::payout(3, 1.233).cents(), 370);
    }

    #[test]
    fn whole_units_truncates() {
        assert_eq!(Money::from_cents(99_99).whole_units(), 99);
        assert_eq!(Money::from_cents(100).whole_units(), 1);
    }

    #[test]
    fn display_pads_cents() {
        assert_eq!(Money::from_cents(400_005).to_string(), "4000.05");
        assert_eq!(Money::from_cents(-50).to_string(), "-0.50");
    }

    #[test]
    fn json_is_decimal() {
        let json = serde_json::to_string(&Money::from_units(4000)).unwrap();
        assert_eq!(json, "4000.0");
        let back: Money = serde_json::from_str("12.34").unwrap();
        assert_eq!(back.cents(), 1234);
    }
}

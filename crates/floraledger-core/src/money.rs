//! Money type stored as integer minor units.
//!
//! A [`Money`] holds a currency amount as a whole number of cents. Costs and
//! sale prices arrive as decimals from invoices and operators; they are
//! rounded once, on the way in, so two writers that rounded differently end
//! up with the same value on disk.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// A currency amount in cents.
///
/// Serialized as a bare integer number of cents.
///
/// # Examples
///
/// ```
/// use floraledger_core::Money;
/// use rust_decimal_macros::dec;
///
/// let cost = Money::from_decimal(dec!(2.499)).unwrap();
/// assert_eq!(cost.cents(), 250);
/// assert_eq!(cost.to_string(), "2.50");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero cents.
    pub const ZERO: Self = Self(0);

    /// One cent, the smallest representable difference.
    pub const CENT: Self = Self(1);

    /// Largest representable amount.
    pub const MAX: Self = Self(i64::MAX);

    /// Create from a number of cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Number of cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Round a decimal to two places (midpoint away from zero) and convert.
    ///
    /// Returns `None` if the value does not fit.
    #[must_use]
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(Self)
    }

    /// Like [`Money::from_decimal`], clamping to the representable range.
    #[must_use]
    pub fn from_decimal_saturating(value: Decimal) -> Self {
        Self::from_decimal(value).unwrap_or(if value.is_sign_negative() {
            Self(i64::MIN)
        } else {
            Self::MAX
        })
    }

    /// The amount as a decimal with two places.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Check if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Check if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Absolute difference between two amounts.
    #[must_use]
    pub const fn abs_diff(self, other: Self) -> Self {
        Self(self.0.abs_diff(other.0) as i64)
    }

    /// Check whether two amounts are the same within `tolerance`.
    ///
    /// The comparison is strict: with a one-cent tolerance only identical
    /// amounts match.
    #[must_use]
    pub const fn is_near(self, other: Self, tolerance: Self) -> bool {
        let diff = self.0.abs_diff(other.0);
        diff == 0 || (tolerance.0 > 0 && diff < tolerance.0 as u64)
    }

    /// Multiply by a decimal factor, rounding the result to cents.
    #[must_use]
    pub fn scale(self, factor: Decimal) -> Self {
        self.to_decimal()
            .checked_mul(factor)
            .map_or(Self::MAX, Self::from_decimal_saturating)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

/// Error parsing a [`Money`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid money amount: {0:?}")]
pub struct ParseMoneyError(pub String);

impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept the comma decimal separator used on Italian invoices.
        let normalized = s.trim().replace(',', ".");
        Decimal::from_str(&normalized)
            .ok()
            .and_then(Self::from_decimal)
            .ok_or_else(|| ParseMoneyError(s.to_string()))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

//! Integer VND money type.
//!
//! All amounts in the system are Vietnamese đồng, which has no minor unit.
//! Prices, discounts, and totals are therefore plain integers; formatting
//! with grouping separators is a display concern only.

use serde::{Deserialize, Serialize};

/// An amount in Vietnamese đồng.
///
/// Wraps an `i64` so an amount can never be confused with a quantity or an
/// ID. Subtraction saturates at zero: a discount can never push a total
/// negative.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Vnd(i64);

impl Vnd {
    /// Zero đồng.
    pub const ZERO: Self = Self(0);

    /// Create an amount from a raw đồng value.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the raw đồng value.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Multiply a unit price by a quantity.
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0 * quantity as i64)
    }

    /// Subtract, clamping at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        let amount = self.0 - other.0;
        if amount < 0 { Self(0) } else { Self(amount) }
    }

    /// Apply a percentage, rounding half-up on the integer math.
    ///
    /// Used for the loyalty discount: `round(subtotal * percent / 100)`.
    #[must_use]
    pub const fn percent(self, percent: u32) -> Self {
        Self((self.0 * percent as i64 + 50) / 100)
    }
}

impl std::ops::Add for Vnd {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl std::iter::Sum for Vnd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, std::ops::Add::add)
    }
}

impl std::fmt::Display for Vnd {
    /// Formats with dot grouping, e.g. `194.000 ₫`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let negative = self.0 < 0;
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i).is_multiple_of(3) {
                grouped.push('.');
            }
            grouped.push(c);
        }
        if negative {
            write!(f, "-{grouped} ₫")
        } else {
            write!(f, "{grouped} ₫")
        }
    }
}

impl From<i64> for Vnd {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl From<Vnd> for i64 {
    fn from(amount: Vnd) -> Self {
        amount.0
    }
}

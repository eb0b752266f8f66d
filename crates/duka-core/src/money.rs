//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Stored as floats, a sale total drifts away from its line items:        │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer cents everywhere                                 │
//! │    Sale.total_cents == Σ SaleItem.subtotal_cents, exactly               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use duka_core::money::Money;
//!
//! let price = Money::from_cents(1_500); // TSh 15.00
//! let line = price.checked_multiply_quantity(3).unwrap();
//! assert_eq!(line.cents(), 4_500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// Product.price_cents ──► SaleLine.unit_price_cents ──► SaleItem.subtotal_cents
///                                                              │
///                                                              ▼
///                                             Sale.total_cents = Σ subtotals
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (shillings).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a line quantity.
    ///
    /// Returns `None` when the product does not fit in 64 bits. Line
    /// subtotals come straight from client input, so overflow is a
    /// validation failure rather than a panic.
    ///
    /// ```rust
    /// use duka_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(299).checked_multiply_quantity(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub fn checked_multiply_quantity(&self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }

    /// Adds two values, returning `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Percentage change from `previous` to `self`, rounded to two decimals.
    ///
    /// A previous value of zero yields `0.0`, matching how the admin
    /// dashboard reports growth for a first month of trading.
    pub fn growth_rate_from(&self, previous: Money) -> f64 {
        if previous.is_zero() {
            return 0.0;
        }
        let rate = (self.0 - previous.0) as f64 / previous.0 as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display in Tanzanian shillings. Debug and log output only.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}TSh {}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts() {
        let money = Money::from_cents(1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "TSh 10.99");
        assert_eq!(Money::from_cents(500).to_string(), "TSh 5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-TSh 5.50");
    }

    #[test]
    fn test_sum_of_lines() {
        let total: Money = [1_500, 250, 0]
            .into_iter()
            .map(Money::from_cents)
            .sum();
        assert_eq!(total.cents(), 1_750);
    }

    #[test]
    fn test_growth_rate() {
        let this_month = Money::from_cents(15_000);
        assert_eq!(this_month.growth_rate_from(Money::from_cents(10_000)), 50.0);
        assert_eq!(Money::from_cents(5_000).growth_rate_from(Money::from_cents(10_000)), -50.0);
        assert_eq!(this_month.growth_rate_from(Money::zero()), 0.0);
    }

    #[test]
    fn test_checked_add_overflow() {
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }
}

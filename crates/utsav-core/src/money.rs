//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A declared booking amount that is "off by a paisa" must be             │
//! │  distinguishable from one that is off by a rupee. Floats cannot         │
//! │  give that guarantee; integers can.                                     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    ₹399.00 = 39900 paise, compared exactly, summed exactly              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use utsav_core::money::Money;
//!
//! // Create from rupees (rate tables) or paise (gateway amounts)
//! let price = Money::from_rupees(399);
//! assert_eq!(price.paise(), 39900);
//!
//! let total = price * 6i64;
//! assert_eq!(total, Money::from_rupees(2394));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (the smallest INR unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative intermediates (discount deltas)
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for the audit blob and DTOs
///
/// Every amount in the system flows through this type: rate table entries,
/// per-unit prices, booking totals, discount amounts, gateway order amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise (the smallest currency unit).
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    ///
    /// Rate tables are configured in whole rupees; this is the preferred
    /// constructor for configuration values.
    ///
    /// ```rust
    /// use utsav_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupees(399).paise(), 39900);
    /// ```
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Returns the value in paise.
    ///
    /// This is what the payment gateway consumes (`amountMinorUnits`).
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Absolute difference between two amounts.
    ///
    /// Used by the reconciliation tolerance check: a declared amount is
    /// accepted when `declared.abs_diff(computed) <= Money::from_paise(1)`.
    #[inline]
    pub const fn abs_diff(&self, other: Money) -> Money {
        Money((self.0 - other.0).abs())
    }

    /// Multiplies by a unit count.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// The smaller of two amounts.
    ///
    /// A flat discounted rate must never raise a price above its base, so
    /// bulk pricing takes `base.min_of(flat)`.
    #[inline]
    pub const fn min_of(&self, other: Money) -> Money {
        if self.0 <= other.0 {
            *self
        } else {
            other
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// For logs and debugging only; client-facing formatting is out of scope.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
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

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Summation over per-unit prices must land on the exact booking total.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rupees() {
        let money = Money::from_rupees(399);
        assert_eq!(money.paise(), 39900);
        assert_eq!(money.rupees(), 399);
        assert_eq!(money.paise_part(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_rupees(399)), "₹399.00");
        assert_eq!(format!("{}", Money::from_paise(105)), "₹1.05");
        assert_eq!(format!("{}", Money::from_paise(-550)), "-₹5.50");
        assert_eq!(format!("{}", Money::zero()), "₹0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_rupees(10);
        let b = Money::from_rupees(5);

        assert_eq!((a + b).rupees(), 15);
        assert_eq!((a - b).rupees(), 5);
        // Both multiplier types: i64 for paise math, u32 for pass counts
        assert_eq!((a * 3i64).rupees(), 30);
        assert_eq!((a * 3u32).rupees(), 30);
    }

    #[test]
    fn test_abs_diff_tolerance() {
        let computed = Money::from_rupees(2100);
        let declared = Money::from_paise(210001);

        assert_eq!(computed.abs_diff(declared), Money::from_paise(1));
        assert!(computed.abs_diff(declared) <= Money::from_paise(1));

        let way_off = Money::from_rupees(2101);
        assert!(computed.abs_diff(way_off) > Money::from_paise(1));
    }

    #[test]
    fn test_min_of() {
        let base = Money::from_rupees(399);
        let flat = Money::from_rupees(350);
        assert_eq!(base.min_of(flat), flat);
        // A flat rate above base must not raise the price
        assert_eq!(Money::from_rupees(99).min_of(flat), Money::from_rupees(99));
    }

    #[test]
    fn test_sum() {
        let total: Money = [399, 399, 99]
            .iter()
            .map(|r| Money::from_rupees(*r))
            .sum();
        assert_eq!(total, Money::from_rupees(897));
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_paise(1).is_positive());
        assert!(Money::from_paise(-1).is_negative());
    }
}

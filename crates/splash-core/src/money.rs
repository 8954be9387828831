//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  The payment gate compares cash + online against the bill total.       │
//! │  With floats that comparison drifts; with paise it is exact and the    │
//! │  ₹0.01 tolerance is a plain integer (PAYMENT_TOLERANCE_PAISE = 1).     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use splash_core::money::Money;
//!
//! let ticket = Money::from_paise(50_000); // ₹500.00
//! let two = ticket * 2_i64;
//! assert_eq!(two.to_string(), "₹1000.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Rate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 of a rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: compensation deltas and refund arithmetic can go negative
/// - **Single field tuple struct**: serialises as a bare integer
/// - **sqlx transparent**: stored as an INTEGER column
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Costume.unit_price ───► CostumeLine.amount ──┐                         │
/// │  Locker.unit_price  ───► LockerLine.unit_price├─► subtotal ─► total     │
/// │  TicketType.price   ───► TicketLine.total ────┘                         │
/// │                                                                         │
/// │  Costume/Locker.unit_refund_value ─► refund_price ─► refund_amount      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    ///
    /// ## Example
    /// ```rust
    /// use splash_core::money::Money;
    ///
    /// let price = Money::from_paise(1099); // ₹10.99
    /// assert_eq!(price.paise(), 1099);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Returns the value in paise.
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

    /// Zero rupees.
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Applies a rate (GST, percentage discount) with half-up rounding.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, widened to i128 so a
    /// large bill cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use splash_core::money::Money;
    /// use splash_core::types::Rate;
    ///
    /// let amount = Money::from_paise(1000); // ₹10.00
    /// let gst = amount.apply_rate(Rate::from_bps(1800)); // 18%
    /// assert_eq!(gst.paise(), 180);
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        let paise = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_paise(paise as i64)
    }

    /// Restricts the value to `[min, max]`.
    ///
    /// Used by the discount law: a discount can neither be negative nor
    /// exceed the subtotal it is taken from.
    #[inline]
    pub fn clamp_between(self, min: Money, max: Money) -> Money {
        if self < min {
            min
        } else if self > max {
            max
        } else {
            self
        }
    }

    /// True when the two amounts differ by at most `tolerance`.
    ///
    /// Compared in i128 so amounts at the ends of the range cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use splash_core::money::Money;
    ///
    /// let total = Money::from_paise(10_000);
    /// assert!(total.within(Money::from_paise(9_999), Money::from_paise(1)));
    /// assert!(!total.within(Money::from_paise(9_998), Money::from_paise(1)));
    /// ```
    #[inline]
    pub fn within(&self, other: Money, tolerance: Money) -> bool {
        (self.0 as i128 - other.0 as i128).abs() <= tolerance.0 as i128
    }

    /// Addition that returns `None` instead of wrapping.
    ///
    /// ## Example
    /// ```rust
    /// use splash_core::money::Money;
    ///
    /// assert_eq!(
    ///     Money::from_paise(100).checked_add(Money::from_paise(50)),
    ///     Some(Money::from_paise(150))
    /// );
    /// assert_eq!(Money::from_paise(i64::MAX).checked_add(Money::from_paise(1)), None);
    /// ```
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    /// Addition pinned at the ends of the range. For reporting only.
    #[inline]
    pub const fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }
}

/// Formats as rupees: `₹10.99`, `-₹5.50`.
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(1099);
        assert_eq!(money.paise(), 1099);
        assert_eq!(money.rupees(), 10);
        assert_eq!(money.paise_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_paise(1099).to_string(), "₹10.99");
        assert_eq!(Money::from_paise(500).to_string(), "₹5.00");
        assert_eq!(Money::from_paise(-550).to_string(), "-₹5.50");
        assert_eq!(Money::zero().to_string(), "₹0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_paise(1000);
        let b = Money::from_paise(500);

        assert_eq!((a + b).paise(), 1500);
        assert_eq!((a - b).paise(), 500);
        assert_eq!((a * 3_i64).paise(), 3000);
    }

    #[test]
    fn test_apply_rate_rounds_half_up() {
        // ₹10.00 at 8.25% = ₹0.825 → ₹0.83
        let tax = Money::from_paise(1000).apply_rate(Rate::from_bps(825));
        assert_eq!(tax.paise(), 83);
    }

    #[test]
    fn test_clamp_between() {
        let cap = Money::from_paise(1000);
        assert_eq!(Money::from_paise(-5).clamp_between(Money::zero(), cap), Money::zero());
        assert_eq!(Money::from_paise(1500).clamp_between(Money::zero(), cap), cap);
        assert_eq!(
            Money::from_paise(400).clamp_between(Money::zero(), cap),
            Money::from_paise(400)
        );
    }

    #[test]
    fn test_sum() {
        let items = [Money::from_paise(100), Money::from_paise(250)];
        let total: Money = items.iter().sum();
        assert_eq!(total.paise(), 350);
    }

    #[test]
    fn test_within_tolerance() {
        let total = Money::from_paise(100_000);
        assert!(total.within(Money::from_paise(100_001), Money::from_paise(1)));
        assert!(!total.within(Money::from_paise(100_002), Money::from_paise(1)));
    }

    #[test]
    fn test_extremes_do_not_overflow() {
        let max = Money::from_paise(i64::MAX);
        let min = Money::from_paise(i64::MIN);

        assert_eq!(max.checked_add(Money::from_paise(1)), None);
        assert_eq!(min.checked_add(Money::from_paise(-1)), None);
        assert_eq!(max.saturating_add(max), max);

        assert!(!max.within(min, Money::from_paise(1)));
        assert!(!Money::zero().within(min, Money::from_paise(1)));
        assert!(max.within(max, Money::zero()));
    }
}

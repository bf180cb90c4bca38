//! # Money Module
//!
//! Provides the `Money` type for euro amounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  3000.00 € / 36 months = 83.3333… € per month                           │
//! │    10 months → 833.33 €, 12 → 1000.00 €, 2 → 166.67 €                  │
//! │                                                                         │
//! │  Summing floats across a depreciation window drifts by fractions of a  │
//! │  cent. Summing cents never does:                                       │
//! │    83333 + 100000 + 100000 + 16667 = 300000 cents                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pendler_core::money::Money;
//!
//! let rate = Money::from_cents(2800);           // 28.00 €
//! let refund = Money::from_cents(1000);         // 10.00 €
//! assert_eq!((rate - refund).cents(), 1800);
//!
//! // Pro-rata share with rounding to whole cents
//! let price = Money::from_cents(300_000);
//! assert_eq!(price.mul_ratio(10, 36).cents(), 83_333);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in euro cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: balances (allowances minus reimbursements) go negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as cents**: floats only appear at the backup-import boundary
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  TaxRates.meal_rate_24h ──► TripEntry.rate ──► TripEntry.deductible     │
/// │                                                                         │
/// │  TaxRates.mileage_rate_car × km ──► MileageEntry.allowance              │
/// │                                                                         │
/// │  EquipmentEntry.price ──► yearly deduction ──► MonthlyBucket.equipment  │
/// │                                                                         │
/// │  MonthlyBucket.* ──► YearlyRollup.grand_total ──► CSV export            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use pendler_core::money::Money;
    ///
    /// let per_diem = Money::from_cents(1400); // 14.00 €
    /// assert_eq!(per_diem.cents(), 1400);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from euros and cents.
    ///
    /// For negative amounts only the euro part should be negative:
    /// `from_euros_cents(-5, 50)` is -5.50 €.
    #[inline]
    pub const fn from_euros_cents(euros: i64, cents: i64) -> Self {
        if euros < 0 {
            Money(euros * 100 - cents)
        } else {
            Money(euros * 100 + cents)
        }
    }

    /// Converts a euro float to Money, rounding half away from zero.
    ///
    /// Only for boundary input: user-typed amounts and the original app's
    /// JSON backups, which store euros as floating point numbers.
    ///
    /// ```rust
    /// use pendler_core::money::Money;
    ///
    /// assert_eq!(Money::from_euros(952.0).cents(), 95_200);
    /// assert_eq!(Money::from_euros(0.3).cents(), 30);
    /// assert_eq!(Money::from_euros(1.005).cents(), 101);
    /// ```
    pub fn from_euros(euros: f64) -> Self {
        // Nudge by a tiny epsilon so 1.005 (stored as 1.00499…) rounds like
        // the value the user typed.
        let scaled = euros * 100.0;
        let nudged = scaled + scaled.signum() * 1e-7;
        Money(nudged.round() as i64)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole euro portion.
    #[inline]
    pub const fn euros(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cent portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the value as a float, for charts and display only.
    #[inline]
    pub fn as_euros_f64(&self) -> f64 {
        self.0 as f64 / 100.0
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    ///
    /// Deductibles have a designed floor of zero: a reimbursement larger than
    /// the per-diem does not create a negative deduction.
    ///
    /// ```rust
    /// use pendler_core::money::Money;
    ///
    /// let net = Money::from_cents(1400) - Money::from_cents(2000);
    /// assert_eq!(net.floor_zero(), Money::zero());
    /// ```
    #[inline]
    pub const fn floor_zero(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Multiplies by `numerator / denominator`, rounding half away from zero.
    ///
    /// Used for pro-rata depreciation (`price × months / 36`).
    ///
    /// ## Implementation
    /// Integer math in i128: `(2·a·n + d) / (2·d)` for non-negative results,
    /// mirrored for negative ones.
    pub fn mul_ratio(&self, numerator: i64, denominator: i64) -> Money {
        if denominator == 0 {
            return Money::zero();
        }
        let product = self.0 as i128 * numerator as i128;
        let den = denominator as i128;
        let negative = (product < 0) != (den < 0);
        let (p, d) = (product.abs(), den.abs());
        let rounded = (2 * p + d) / (2 * d);
        Money::from_cents(if negative { -rounded } else { rounded } as i64)
    }

    /// Multiplies a per-kilometre rate by a distance, rounding once to cents.
    ///
    /// ## Example
    /// ```rust
    /// use pendler_core::money::Money;
    ///
    /// let rate = Money::from_cents(30); // 0.30 €/km
    /// assert_eq!(rate.per_km(5.0).cents(), 150);
    /// assert_eq!(rate.per_km(12.5).cents(), 375);
    /// ```
    pub fn per_km(&self, km: f64) -> Money {
        let raw = self.0 as f64 * km;
        let nudged = raw + raw.signum() * 1e-7;
        Money::from_cents(nudged.round() as i64)
    }

    /// Formats as a plain decimal with two places (`"833.33"`), as used in CSV.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.euros().abs(), self.cents_part())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `"18.00 €"`.
///
/// ## Note
/// For logs and the CLI. A localized front end formats on its own.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} €", self.to_decimal_string())
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

/// Summing is exact, so totals do not depend on iteration order.
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

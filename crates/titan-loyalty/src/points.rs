//! # Points Module
//!
//! Provides the `Points` type for loyalty point values.
//!
//! ## Why Decimal Points?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Money-based rules earn a fraction of the amount paid:                 │
//! │    0.1 points per $ × $20.00 / 2 units = 1.0 point per unit            │
//! │                                                                         │
//! │  In f64:                                                                │
//! │    0.1 × 20.0 / 2.0 = 1.0000000000000002  ❌ breaks equality checks     │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal                                             │
//! │    Every intermediate value is an exact decimal, and rounding to       │
//! │    2 places happens explicitly, exactly where the rule says so.        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use titan_loyalty::points::{Points, Rounding};
//!
//! let earned = Points::from_f64(12.345);
//! assert_eq!(earned.round(2, Rounding::HalfUp).to_f64(), 12.35);
//!
//! // Returns carry negative points
//! let refunded = -earned;
//! assert!(refunded.is_negative());
//! ```

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

// =============================================================================
// Rounding
// =============================================================================

/// How a midpoint value (e.g. `0.125` at 2 decimals) is resolved.
///
/// ## Business Context
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────┐
/// │  POS money-mode lump sum      → HalfUp    (0.125 → 0.13)            │
/// │  Sales-side (back office)     → HalfDown  (0.125 → 0.12)            │
/// │                                                                     │
/// │  The two channels deliberately disagree on midpoints. Keep it.      │
/// └─────────────────────────────────────────────────────────────────────┘
/// ```
///
/// Both variants are symmetric around zero, so `-0.125` rounds to `-0.13`
/// (HalfUp) and a return mirrors the purchase it reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Midpoint away from zero.
    #[default]
    HalfUp,
    /// Midpoint toward zero.
    HalfDown,
}

impl Rounding {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Rounding::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Rounding::HalfDown => RoundingStrategy::MidpointTowardZero,
        }
    }
}

// =============================================================================
// Points Type
// =============================================================================

/// A loyalty point value. Signed: returns produce negative points.
///
/// ## Design Decisions
/// - **Decimal (signed)**: Exact arithmetic, negative values for returns
/// - **Single field tuple struct**: Zero-cost wrapper over `Decimal`
/// - **Serialized as a JSON number**: The POS frontend reads `points: 1.5`
///
/// ## Where Points Flow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Rule.reward_point_amount ──┬──► lump sum ──► Award { points }         │
/// │                             │                                           │
/// │                             └──► per unit ──► Award × n (split)        │
/// │                                                                         │
/// │  Award.points ──► loyalty card balance / coupon / gift card (caller)   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Points(Decimal);

impl Points {
    /// Wraps an exact decimal value.
    #[inline]
    pub const fn new(value: Decimal) -> Self {
        Points(value)
    }

    /// Converts from the `f64` values the POS hands us.
    ///
    /// NaN and infinities become zero; order lines are validated for
    /// finiteness before they reach the calculator.
    ///
    /// ## Example
    /// ```rust
    /// use titan_loyalty::points::Points;
    ///
    /// assert_eq!(Points::from_f64(0.1).to_f64(), 0.1);
    /// assert!(Points::from_f64(f64::NAN).is_zero());
    /// ```
    pub fn from_f64(value: f64) -> Self {
        Points(to_decimal(value))
    }

    /// Returns zero points.
    #[inline]
    pub const fn zero() -> Self {
        Points(Decimal::ZERO)
    }

    /// Returns the exact decimal value.
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Returns the value as `f64` (for display and JSON consumers).
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (a deduction).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Points(self.0.abs())
    }

    /// Sum, `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Points)
    }

    /// Scaled by `factor`, `None` on overflow.
    #[inline]
    pub fn checked_mul(self, factor: Decimal) -> Option<Self> {
        self.0.checked_mul(factor).map(Points)
    }

    /// Rounds to `decimals` places with an explicit midpoint strategy.
    ///
    /// ## Example
    /// ```rust
    /// use titan_loyalty::points::{Points, Rounding};
    ///
    /// let p = Points::from_f64(0.125);
    /// assert_eq!(p.round(2, Rounding::HalfUp).to_f64(), 0.13);
    /// assert_eq!(p.round(2, Rounding::HalfDown).to_f64(), 0.12);
    /// assert_eq!((-p).round(2, Rounding::HalfUp).to_f64(), -0.13);
    /// ```
    pub fn round(&self, decimals: u32, rounding: Rounding) -> Self {
        Points(self.0.round_dp_with_strategy(decimals, rounding.strategy()))
    }
}

/// Converts an `f64` to `Decimal`, mapping non-finite and out-of-range
/// values to zero. Order lines are range-checked before they get here.
#[inline]
pub(crate) fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pts", self.0.normalize())
    }
}

impl From<Decimal> for Points {
    fn from(value: Decimal) -> Self {
        Points(value)
    }
}

impl Add for Points {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Points(self.0 + other.0)
    }
}

impl AddAssign for Points {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Points {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Points(self.0 - other.0)
    }
}

impl Neg for Points {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Points(-self.0)
    }
}

/// Scaling by a quantity or a sign.
impl Mul<Decimal> for Points {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Decimal) -> Self {
        Points(self.0 * factor)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

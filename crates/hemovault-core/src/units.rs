//! # Units Module
//!
//! Provides the `Units` type for counting whole-blood stock safely.
//!
//! ## Why Integer Units?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE TWO-CURRENCIES PROBLEM                                             │
//! │                                                                         │
//! │  The system measures blood two ways:                                    │
//! │    • millilitres  - what the collection bag actually holds (350-500)   │
//! │    • units        - what the ledger, requests and alerts count          │
//! │                                                                         │
//! │  Mixing them silently is how a 450 "unit" credit corrupts a ledger.    │
//! │  `Units` is a distinct type, so ml can never flow into a unit slot     │
//! │  without an explicit conversion through `from_volume_ml`.              │
//! │                                                                         │
//! │  Conversion constant: 1 unit = 450 ml (STANDARD_UNIT_VOLUME_ML)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use hemovault_core::Units;
//!
//! // Ledger arithmetic stays in whole units
//! let stock = Units::new(10) + Units::new(2);
//! assert_eq!(stock.count(), 12);
//!
//! // A standard 450 ml collection credits exactly one unit
//! assert_eq!(Units::from_volume_ml(450), Units::new(1));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::STANDARD_UNIT_VOLUME_ML;

// =============================================================================
// Units Type
// =============================================================================

/// A count of whole-blood units.
///
/// ## Design Decisions
/// - **i64 (signed)**: differences (`requested - fulfilled`) are first-class
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Transparent serde/sqlx**: serializes and stores as a plain integer
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Units(i64);

impl Units {
    /// Creates a unit count.
    #[inline]
    pub const fn new(count: i64) -> Self {
        Units(count)
    }

    /// Zero units.
    #[inline]
    pub const fn zero() -> Self {
        Units(0)
    }

    /// Returns the raw count.
    #[inline]
    pub const fn count(&self) -> i64 {
        self.0
    }

    /// Converts a collection volume to its unit-equivalent.
    ///
    /// Rounds to the nearest whole unit, with a floor of one: every accepted
    /// donation credits at least one unit, and the standard 350/450/500 ml
    /// bags all credit exactly one.
    ///
    /// ## Example
    /// ```rust
    /// use hemovault_core::Units;
    ///
    /// assert_eq!(Units::from_volume_ml(350).count(), 1);
    /// assert_eq!(Units::from_volume_ml(450).count(), 1);
    /// assert_eq!(Units::from_volume_ml(500).count(), 1);
    /// assert_eq!(Units::from_volume_ml(900).count(), 2);
    /// ```
    #[inline]
    pub const fn from_volume_ml(quantity_ml: i64) -> Self {
        let rounded = (quantity_ml + STANDARD_UNIT_VOLUME_ML / 2) / STANDARD_UNIT_VOLUME_ML;
        if rounded < 1 {
            Units(1)
        } else {
            Units(rounded)
        }
    }

    /// Returns the nominal volume of this many units, in millilitres.
    ///
    /// Used where a derived `quantity_ml` is reported for ledger state
    /// (the canonical counter is units; volume is always units × 450).
    #[inline]
    pub const fn volume_ml(&self) -> i64 {
        self.0 * STANDARD_UNIT_VOLUME_ML
    }

    /// Checks if the count is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the count is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

/// Fractional unit-equivalent of a volume, for reporting.
///
/// Monthly reports express totals as `total_ml / 450` without rounding, so a
/// month of three 350 ml donations reads 2.33 units, not 3.
#[inline]
pub fn fractional_units(quantity_ml: i64) -> f64 {
    quantity_ml as f64 / STANDARD_UNIT_VOLUME_ML as f64
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Addition of two unit counts.
impl Add for Units {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Units(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Units {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two unit counts.
impl Sub for Units {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Units(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Units {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

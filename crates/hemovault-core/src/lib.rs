//! # hemovault-core: Pure Domain Logic for HemoVault
//!
//! This crate is the **heart** of HemoVault. It contains every medical and
//! business rule of the blood bank as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       HemoVault Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Callers (UI / API layer)                       │   │
//! │  │   Intake form ──► Allocation form ──► Dashboards ──► Reports    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  hemovault-engine                               │   │
//! │  │    process_donation, allocate_blood, alerts, views, reports     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ hemovault-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   units   │  │eligibility │  │ validation│  │   │
//! │  │   │BloodGroup │  │   Units   │  │ 90-day rule│  │   rules   │  │   │
//! │  │   │ statuses  │  │ ml ⇄ unit │  │ labels     │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  hemovault-db (Database Layer)                  │   │
//! │  │         SQLite queries, stock ledger, migrations, repos         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Donor, Donation, BloodRequest, status enums)
//! - [`units`] - Whole-blood unit counting with integer arithmetic
//! - [`eligibility`] - The 90-day donor eligibility window
//! - [`validation`] - Field-level validation rules
//! - [`views`] - Read-model row types shared with the storage/engine layers
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No Clock Access**: "today" is always a parameter, never `Utc::now()`
//! 3. **Integer Units**: Stock is counted in whole units (i64), never floats
//! 4. **Derived Statuses**: stock/deadline/eligibility labels are computed from
//!    numeric fields on read, never stored as independently-settable state

// =============================================================================
// Module Declarations
// =============================================================================

pub mod eligibility;
pub mod error;
pub mod types;
pub mod units;
pub mod validation;
pub mod views;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use hemovault_core::Units` instead of
// `use hemovault_core::units::Units`

pub use error::{CoreError, ValidationError};
pub use types::*;
pub use units::Units;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Volume of one standard whole-blood unit, in millilitres.
///
/// ## Why a constant?
/// Stock is counted in whole units but donations and transfusions record
/// their actual volume. Every ml⇄unit conversion in the system goes through
/// this single value (see [`units`]).
pub const STANDARD_UNIT_VOLUME_ML: i64 = 450;

/// Minimum interval between two donations by the same donor, in days.
///
/// ## Medical Reason
/// Whole-blood donors must wait for red cell recovery before donating again.
/// A donor whose last donation is fewer than this many days old is refused;
/// day 90 itself is eligible.
pub const DONATION_INTERVAL_DAYS: i64 = 90;

/// Minimum hemoglobin level for a donation attempt, in g/dL.
///
/// ## Medical Reason
/// Donating below this level risks donor anemia. This gates the *attempt*,
/// independent of the interval rule above.
pub const MIN_HEMOGLOBIN_G_DL: f64 = 12.5;

/// Accepted collection volume range for a single donation, in millilitres.
///
/// ## Medical Reason
/// Standard whole-blood collections are 350/450/500 ml bags. Anything outside
/// this window is an entry error, not a donation.
pub const MIN_DONATION_VOLUME_ML: i64 = 250;
pub const MAX_DONATION_VOLUME_ML: i64 = 550;

/// Default number of rows returned by the recent-donations view.
pub const DEFAULT_RECENT_DONATIONS: i64 = 50;

/// Upper bound accepted for a transfusion patient's age.
pub const MAX_PATIENT_AGE: i64 = 120;

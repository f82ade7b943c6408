//! # Error Types
//!
//! Domain-specific error types for hemovault-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  hemovault-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  hemovault-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  hemovault-engine errors                                               │
//! │  └── EngineError      - Storage faults / programmer errors             │
//! │                                                                         │
//! │  Expected business failures never escape the engine as errors: they    │
//! │  are folded into {success: false, message} outcomes for the caller.    │
//! │  The Display text of these variants IS that message.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, counts, blood groups)
//! 3. Errors are enum variants, never String
//! 4. Each variant's message is fit to show a user unchanged

use thiserror::Error;

use crate::types::BloodGroup;
use crate::units::Units;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the write paths.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An entity referenced by id does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Not enough units on the shelf to cover a debit.
    ///
    /// ## When This Occurs
    /// - An allocation asks for more units than the blood group currently has
    /// - A concurrent allocation drained the stock after the caller last read it
    ///
    /// The failed debit leaves the ledger untouched.
    #[error("Insufficient stock for {blood_group}: available {available}, requested {requested}")]
    InsufficientStock {
        blood_group: BloodGroup,
        available: Units,
        requested: Units,
    },

    /// The donor's 90-day interval since the last donation has not elapsed.
    #[error("Donor is not eligible to donate: {days_remaining} days remaining")]
    DonorNotEligible { days_remaining: i64 },

    /// The operation kept colliding with concurrent writers after bounded
    /// internal retries.
    #[error("Operation conflicted with concurrent updates, please retry")]
    ConcurrencyConflict,

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input and attempt-level validation failures.
///
/// These occur before any state is touched; the write paths report them as
/// structured failure outcomes, never as faults.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. malformed blood pressure reading).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A calendar field points into the past.
    #[error("{field} must not be in the past")]
    DateInPast { field: String },

    /// Submitted blood group differs from the donor's registered group.
    #[error("Blood group {actual} does not match donor's registered group {expected}")]
    BloodGroupMismatch {
        expected: BloodGroup,
        actual: BloodGroup,
    },

    /// The measured hemoglobin is below the donation minimum.
    #[error("Hemoglobin level {level} g/dL is below the 12.5 g/dL minimum")]
    HemoglobinTooLow { level: f64 },

    /// The referenced staff member exists but is not active.
    #[error("Staff member {staff_id} is not active")]
    InactiveStaff { staff_id: i64 },

    /// The referenced hospital exists but has been deactivated.
    #[error("Hospital {hospital_id} is not active")]
    InactiveHospital { hospital_id: i64 },

    /// An allocation asks for more units than the request still needs.
    #[error("Cannot allocate {requested} unit(s): only {pending} pending on this request")]
    OverAllocation { requested: Units, pending: Units },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

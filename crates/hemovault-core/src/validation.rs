//! # Validation Module
//!
//! Field-level validation for donation intake, allocation, and request entry.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI / API layer)                                      │
//! │  ├── Basic format checks, immediate user feedback                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine operation (Rust)                                      │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: field + attempt-level rules, before any mutation     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / foreign key constraints                       │
//! │  └── CHECK (units_available >= 0) as the final backstop                │
//! │                                                                         │
//! │  Defense in depth: each layer catches what the one above missed        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::units::Units;
use crate::{MAX_DONATION_VOLUME_ML, MAX_PATIENT_AGE, MIN_DONATION_VOLUME_ML, MIN_HEMOGLOBIN_G_DL};
use chrono::NaiveDate;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Donation Intake Validators
// =============================================================================

/// Validates a donation collection volume.
///
/// ## Rules
/// - Must be positive
/// - Must fall in the standard whole-blood window (250-550 ml);
///   collection bags come in 350/450/500 ml
///
/// ## Example
/// ```rust
/// use hemovault_core::validation::validate_donation_volume;
///
/// assert!(validate_donation_volume(450).is_ok());
/// assert!(validate_donation_volume(0).is_err());
/// assert!(validate_donation_volume(5000).is_err());
/// ```
pub fn validate_donation_volume(quantity_ml: i64) -> ValidationResult<()> {
    if quantity_ml <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity_ml".to_string(),
        });
    }

    if !(MIN_DONATION_VOLUME_ML..=MAX_DONATION_VOLUME_ML).contains(&quantity_ml) {
        return Err(ValidationError::OutOfRange {
            field: "quantity_ml".to_string(),
            min: MIN_DONATION_VOLUME_ML,
            max: MAX_DONATION_VOLUME_ML,
        });
    }

    Ok(())
}

/// Validates the hemoglobin measured at the current visit.
///
/// This is the attempt-level gate: it applies to the visit regardless of the
/// donor's 90-day interval state.
///
/// ## Rules
/// - Must be a real, positive measurement
/// - Must be at least 12.5 g/dL
pub fn validate_hemoglobin(level: f64) -> ValidationResult<()> {
    if !level.is_finite() || level <= 0.0 {
        return Err(ValidationError::InvalidFormat {
            field: "hemoglobin_level".to_string(),
            reason: "must be a positive measurement in g/dL".to_string(),
        });
    }

    if level < MIN_HEMOGLOBIN_G_DL {
        return Err(ValidationError::HemoglobinTooLow { level });
    }

    Ok(())
}

/// Validates a blood pressure reading in `SYS/DIA` form.
///
/// ## Rules
/// - Must not be empty
/// - Must be two numbers separated by a slash, e.g. `120/80`
/// - Both numbers must be plausible (30-300 mmHg)
///
/// ## Example
/// ```rust
/// use hemovault_core::validation::validate_blood_pressure;
///
/// assert!(validate_blood_pressure("120/80").is_ok());
/// assert!(validate_blood_pressure("120-80").is_err());
/// assert!(validate_blood_pressure("").is_err());
/// ```
pub fn validate_blood_pressure(reading: &str) -> ValidationResult<()> {
    let reading = reading.trim();

    if reading.is_empty() {
        return Err(ValidationError::Required {
            field: "blood_pressure".to_string(),
        });
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "blood_pressure".to_string(),
        reason: "must look like 120/80".to_string(),
    };

    let (systolic, diastolic) = reading.split_once('/').ok_or_else(invalid)?;
    let systolic: u32 = systolic.trim().parse().map_err(|_| invalid())?;
    let diastolic: u32 = diastolic.trim().parse().map_err(|_| invalid())?;

    if !(30..=300).contains(&systolic) || !(30..=300).contains(&diastolic) {
        return Err(invalid());
    }

    Ok(())
}

// =============================================================================
// Allocation Validators
// =============================================================================

/// Validates a transfusion patient's name.
///
/// ## Rules
/// - Must not be empty
/// - Maximum 100 characters
pub fn validate_patient_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "patient_name".to_string(),
        });
    }

    if name.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "patient_name".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates a transfusion patient's age.
pub fn validate_patient_age(age: i64) -> ValidationResult<()> {
    if !(1..=MAX_PATIENT_AGE).contains(&age) {
        return Err(ValidationError::OutOfRange {
            field: "patient_age".to_string(),
            min: 1,
            max: MAX_PATIENT_AGE,
        });
    }

    Ok(())
}

// =============================================================================
// Request Entry Validators
// =============================================================================

/// Validates the unit count of a new hospital request.
pub fn validate_units_requested(units: Units) -> ValidationResult<()> {
    if !units.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "units_requested".to_string(),
        });
    }

    Ok(())
}

/// Validates that a request's required-by date is not already past.
pub fn validate_required_by_date(required_by: NaiveDate, today: NaiveDate) -> ValidationResult<()> {
    if required_by < today {
        return Err(ValidationError::DateInPast {
            field: "required_by_date".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Stock Validators
// =============================================================================

/// Validates a per-group minimum stock threshold.
///
/// Zero is allowed (the group simply never alerts); negative thresholds and
/// implausibly large ones are entry errors.
pub fn validate_minimum_threshold(threshold: i64) -> ValidationResult<()> {
    if !(0..=1000).contains(&threshold) {
        return Err(ValidationError::OutOfRange {
            field: "minimum_threshold".to_string(),
            min: 0,
            max: 1000,
        });
    }

    Ok(())
}

// =============================================================================
// Report Validators
// =============================================================================

/// Validates a report month (1-12).
pub fn validate_report_month(month: u32) -> ValidationResult<()> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::OutOfRange {
            field: "month".to_string(),
            min: 1,
            max: 12,
        });
    }

    Ok(())
}

/// Validates a report year.
///
/// ## Rules
/// - Must be between 2000 and 2100; anything else is an entry error
pub fn validate_report_year(year: i32) -> ValidationResult<()> {
    if !(2000..=2100).contains(&year) {
        return Err(ValidationError::OutOfRange {
            field: "year".to_string(),
            min: 2000,
            max: 2100,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

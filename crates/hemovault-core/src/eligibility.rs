//! # Eligibility Module
//!
//! The 90-day donor eligibility window.
//!
//! ## The Window
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  last donation          day 89            day 90                        │
//! │  ──────●━━━━━━━━━━━━━━━━━━━●━━━━━━━━━━━━━━━━●──────────────▶ time       │
//! │        │                   │                │                           │
//! │        │   NOT ELIGIBLE    │ still blocked  │  ELIGIBLE from day 90     │
//! │        │   (N days shown   │ (1 day left)   │  onwards                  │
//! │        │    in views)      │                │                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two independent gates guard a donation attempt:
//! - **donor-level** (this module): enough days since the last donation.
//!   Persisted advisorily on the donor row, derived live for views.
//! - **attempt-level** ([`crate::validation::validate_hemoglobin`]): the
//!   hemoglobin measured at the current visit.
//!
//! All functions take `today` as a parameter; this crate never reads a clock.

use chrono::NaiveDate;

use crate::DONATION_INTERVAL_DAYS;

/// Whether a donor may donate as of `today`.
///
/// A donor with no prior donation is always eligible. Day 90 after the last
/// donation is the first eligible day.
pub fn is_eligible(last_donation_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    match last_donation_date {
        None => true,
        Some(last) => today.signed_duration_since(last).num_days() >= DONATION_INTERVAL_DAYS,
    }
}

/// Days remaining until the donor becomes eligible. Zero when already eligible.
pub fn days_until_eligible(last_donation_date: Option<NaiveDate>, today: NaiveDate) -> i64 {
    match last_donation_date {
        None => 0,
        Some(last) => {
            let elapsed = today.signed_duration_since(last).num_days();
            (DONATION_INTERVAL_DAYS - elapsed).max(0)
        }
    }
}

/// The eligibility label shown in donor summaries.
pub fn status_label(last_donation_date: Option<NaiveDate>, today: NaiveDate) -> String {
    let remaining = days_until_eligible(last_donation_date, today);
    if remaining == 0 {
        "Eligible".to_string()
    } else {
        format!("Not Eligible ({remaining} days remaining)")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

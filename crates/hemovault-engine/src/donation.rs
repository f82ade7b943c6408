//! # Donation Intake
//!
//! Screens a walk-in donation attempt and, when it passes, records it
//! atomically.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      process_donation                                   │
//! │                                                                         │
//! │  Screening (reads only, any failure → refused outcome)                  │
//! │  ┌──────────┐  ┌──────────┐  ┌───────────┐  ┌──────────┐  ┌─────────┐  │
//! │  │ volume / │→ │  donor   │→ │ 90-day    │→ │ hemoglo- │→ │  staff  │  │
//! │  │ BP shape │  │ + group  │  │ interval  │  │ bin gate │  │  active │  │
//! │  └──────────┘  └──────────┘  └───────────┘  └──────────┘  └─────────┘  │
//! │                                                                         │
//! │  Commit (one transaction, retried on lock contention)                   │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────────────┐  │
//! │  │ insert donation│ → │ credit stock   │ → │ update donor history   │  │
//! │  │ (Completed)    │   │ (+1 unit)      │   │ (date, count, flag)    │  │
//! │  └────────────────┘   └────────────────┘   └────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A refused attempt leaves no trace: no donation row, no stock movement,
//! no donor update.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use hemovault_core::error::{CoreError, ValidationError};
use hemovault_core::types::{BloodGroup, DonationStatus, NewDonation};
use hemovault_core::units::Units;
use hemovault_core::{eligibility, validation};
use hemovault_db::DbResult;

use crate::error::EngineResult;
use crate::{backoff, today, BloodBank, MAX_WRITE_ATTEMPTS};

// =============================================================================
// Request / Outcome Types
// =============================================================================

/// Input for [`BloodBank::process_donation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    /// Registered donor making the donation.
    pub donor_id: i64,

    /// Blood group stated at the desk. Must match the donor's registration.
    pub blood_group: BloodGroup,

    /// Collected volume in millilitres (250-550).
    pub quantity_ml: i64,

    /// Measured hemoglobin in g/dL.
    pub hemoglobin_level: f64,

    /// Blood pressure reading, e.g. `"120/80"`.
    pub blood_pressure: String,

    /// Staff member handling the collection.
    pub staff_id: i64,
}

/// What happened to a donation attempt.
///
/// `success: false` means the attempt was refused for a business reason;
/// `message` says which one. System faults are errors, not outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationOutcome {
    pub success: bool,
    pub message: String,
    pub donation_id: Option<i64>,
}

impl DonationOutcome {
    fn recorded(donation_id: i64) -> Self {
        DonationOutcome {
            success: true,
            message: "Donation recorded successfully.".into(),
            donation_id: Some(donation_id),
        }
    }

    fn refused(message: impl Into<String>) -> Self {
        DonationOutcome {
            success: false,
            message: message.into(),
            donation_id: None,
        }
    }
}

// =============================================================================
// Donation Processing
// =============================================================================

impl BloodBank {
    /// Processes a donation attempt end to end.
    ///
    /// Screening failures (unknown donor, group mismatch, 90-day interval
    /// not elapsed, hemoglobin below 12.5 g/dL, inactive staff, malformed
    /// vitals) come back as refused outcomes. Once screening passes, the
    /// donation row, the stock credit and the donor history update are
    /// committed in a single transaction.
    pub async fn process_donation(&self, request: DonationRequest) -> EngineResult<DonationOutcome> {
        debug!(
            donor_id = request.donor_id,
            blood_group = %request.blood_group,
            "Processing donation"
        );

        // Input shape first; nothing below runs on malformed vitals.
        if let Err(err) = validation::validate_donation_volume(request.quantity_ml) {
            return Ok(DonationOutcome::refused(err.to_string()));
        }
        if let Err(err) = validation::validate_blood_pressure(&request.blood_pressure) {
            return Ok(DonationOutcome::refused(err.to_string()));
        }

        let today = today();

        let Some(donor) = self.db.donors().get_by_id(request.donor_id).await? else {
            return Ok(DonationOutcome::refused(
                CoreError::NotFound {
                    entity: "Donor",
                    id: request.donor_id,
                }
                .to_string(),
            ));
        };

        if donor.blood_group != request.blood_group {
            return Ok(DonationOutcome::refused(
                ValidationError::BloodGroupMismatch {
                    expected: donor.blood_group,
                    actual: request.blood_group,
                }
                .to_string(),
            ));
        }

        if !eligibility::is_eligible(donor.last_donation_date, today) {
            let days_remaining = eligibility::days_until_eligible(donor.last_donation_date, today);
            return Ok(DonationOutcome::refused(
                CoreError::DonorNotEligible { days_remaining }.to_string(),
            ));
        }

        if let Err(err) = validation::validate_hemoglobin(request.hemoglobin_level) {
            return Ok(DonationOutcome::refused(err.to_string()));
        }

        match self.db.staff().get_by_id(request.staff_id).await? {
            None => {
                return Ok(DonationOutcome::refused(
                    CoreError::NotFound {
                        entity: "Staff member",
                        id: request.staff_id,
                    }
                    .to_string(),
                ));
            }
            Some(staff) if !staff.is_active => {
                return Ok(DonationOutcome::refused(
                    ValidationError::InactiveStaff {
                        staff_id: request.staff_id,
                    }
                    .to_string(),
                ));
            }
            Some(_) => {}
        }

        let record = NewDonation {
            donor_id: request.donor_id,
            donation_date: today,
            blood_group: request.blood_group,
            quantity_ml: request.quantity_ml,
            hemoglobin_level: Some(request.hemoglobin_level),
            blood_pressure: Some(request.blood_pressure.clone()),
            donation_status: DonationStatus::Completed,
            staff_id: Some(request.staff_id),
            remarks: None,
        };

        let mut attempt = 1;
        loop {
            match self.commit_donation(&record).await {
                Ok(donation_id) => {
                    info!(
                        donation_id,
                        donor_id = request.donor_id,
                        blood_group = %request.blood_group,
                        quantity_ml = request.quantity_ml,
                        "Donation recorded"
                    );
                    return Ok(DonationOutcome::recorded(donation_id));
                }
                Err(err) if err.is_retryable() && attempt < MAX_WRITE_ATTEMPTS => {
                    warn!(attempt, error = %err, "Donation write conflicted, retrying");
                    backoff(attempt).await;
                    attempt += 1;
                }
                Err(err) if err.is_retryable() => {
                    warn!(
                        donor_id = request.donor_id,
                        "Donation write kept conflicting, giving up"
                    );
                    return Ok(DonationOutcome::refused(
                        CoreError::ConcurrencyConflict.to_string(),
                    ));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Applies one screened donation: donation row, stock credit, donor
    /// history. All three commit together or not at all.
    async fn commit_donation(&self, record: &NewDonation) -> DbResult<i64> {
        let mut tx = self.db.begin().await?;

        let donation_id = self.db.donations().insert(&mut *tx, record).await?;

        let credited = Units::from_volume_ml(record.quantity_ml);
        self.db
            .stock()
            .credit(&mut *tx, record.blood_group, credited, record.staff_id)
            .await?;

        self.db
            .donors()
            .record_donation(&mut *tx, record.donor_id, record.donation_date)
            .await?;

        tx.commit().await?;
        Ok(donation_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use hemovault_core::types::{NewDonor, NewStaff, StaffRole};
    use hemovault_db::{Database, DbConfig};

    async fn test_bank() -> BloodBank {
        let db = Database::new(DbConfig::in_memory()).await.expect("open db");
        BloodBank::new(db)
    }

    async fn register_donor(
        bank: &BloodBank,
        blood_group: BloodGroup,
        last_donation_days_ago: Option<i64>,
    ) -> i64 {
        let today = chrono::Utc::now().date_naive();
        let last_donation_date = last_donation_days_ago.map(|d| today - Duration::days(d));

        let donor = bank
            .database()
            .donors()
            .insert(&NewDonor {
                first_name: "Arjun".into(),
                last_name: "Mehta".into(),
                email: format!("arjun+{}@example.com", blood_group),
                phone: "9822012345".into(),
                blood_group,
                date_of_birth: today - Duration::days(30 * 365),
                gender: "Male".into(),
                address: Some("14 MG Road".into()),
                city: Some("Pune".into()),
                state: Some("Maharashtra".into()),
                pincode: Some("411001".into()),
                last_donation_date,
            })
            .await
            .expect("insert donor");

        donor.donor_id
    }

    async fn register_staff(bank: &BloodBank, active: bool) -> i64 {
        let staff = bank
            .database()
            .staff()
            .insert(&NewStaff {
                first_name: "Meera".into(),
                last_name: "Nair".into(),
                email: format!("meera+{}@example.com", if active { "a" } else { "i" }),
                phone: "9822054321".into(),
                role: StaffRole::Technician,
                hire_date: chrono::Utc::now().date_naive(),
            })
            .await
            .expect("insert staff");

        if !active {
            bank.database()
                .staff()
                .deactivate(staff.staff_id)
                .await
                .expect("deactivate staff");
        }

        staff.staff_id
    }

    fn donation(donor_id: i64, blood_group: BloodGroup, staff_id: i64) -> DonationRequest {
        DonationRequest {
            donor_id,
            blood_group,
            quantity_ml: 450,
            hemoglobin_level: 13.0,
            blood_pressure: "120/80".into(),
            staff_id,
        }
    }

    #[tokio::test]
    async fn test_eligible_donor_credits_stock_and_updates_history() {
        let bank = test_bank().await;
        let donor_id = register_donor(&bank, BloodGroup::OPositive, Some(100)).await;
        let staff_id = register_staff(&bank, true).await;

        let outcome = bank
            .process_donation(donation(donor_id, BloodGroup::OPositive, staff_id))
            .await
            .expect("process");

        assert!(outcome.success);
        assert_eq!(outcome.message, "Donation recorded successfully.");
        assert!(outcome.donation_id.is_some());

        let stock = bank
            .database()
            .stock()
            .get_by_group(BloodGroup::OPositive)
            .await
            .expect("stock");
        assert_eq!(stock.units_available.count(), 1);

        let donor = bank
            .database()
            .donors()
            .get_by_id(donor_id)
            .await
            .expect("query")
            .expect("donor");
        assert_eq!(donor.total_donations, 1);
        assert_eq!(donor.last_donation_date, Some(chrono::Utc::now().date_naive()));
        assert!(!donor.is_eligible);
    }

    #[tokio::test]
    async fn test_unknown_donor_is_refused() {
        let bank = test_bank().await;
        let staff_id = register_staff(&bank, true).await;

        let outcome = bank
            .process_donation(donation(999, BloodGroup::OPositive, staff_id))
            .await
            .expect("process");

        assert!(!outcome.success);
        assert_eq!(outcome.message, "Donor not found: 999");
        assert!(outcome.donation_id.is_none());
    }

    #[tokio::test]
    async fn test_blood_group_mismatch_is_refused() {
        let bank = test_bank().await;
        let donor_id = register_donor(&bank, BloodGroup::APositive, None).await;
        let staff_id = register_staff(&bank, true).await;

        let outcome = bank
            .process_donation(donation(donor_id, BloodGroup::OPositive, staff_id))
            .await
            .expect("process");

        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            "Blood group O+ does not match donor's registered group A+"
        );
    }

    #[tokio::test]
    async fn test_day_89_donor_is_refused_day_90_passes() {
        let bank = test_bank().await;
        let staff_id = register_staff(&bank, true).await;

        let too_soon = register_donor(&bank, BloodGroup::BPositive, Some(89)).await;
        let outcome = bank
            .process_donation(donation(too_soon, BloodGroup::BPositive, staff_id))
            .await
            .expect("process");
        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            "Donor is not eligible to donate: 1 days remaining"
        );

        let on_the_day = register_donor(&bank, BloodGroup::BNegative, Some(90)).await;
        let outcome = bank
            .process_donation(donation(on_the_day, BloodGroup::BNegative, staff_id))
            .await
            .expect("process");
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn test_refused_attempt_leaves_no_trace() {
        let bank = test_bank().await;
        let staff_id = register_staff(&bank, true).await;
        let donor_id = register_donor(&bank, BloodGroup::ABNegative, Some(10)).await;

        let outcome = bank
            .process_donation(donation(donor_id, BloodGroup::ABNegative, staff_id))
            .await
            .expect("process");
        assert!(!outcome.success);

        let stock = bank
            .database()
            .stock()
            .get_by_group(BloodGroup::ABNegative)
            .await
            .expect("stock");
        assert_eq!(stock.units_available.count(), 0);

        let donor = bank
            .database()
            .donors()
            .get_by_id(donor_id)
            .await
            .expect("query")
            .expect("donor");
        assert_eq!(donor.total_donations, 0);
    }

    #[tokio::test]
    async fn test_low_hemoglobin_is_refused() {
        let bank = test_bank().await;
        let donor_id = register_donor(&bank, BloodGroup::ONegative, None).await;
        let staff_id = register_staff(&bank, true).await;

        let mut request = donation(donor_id, BloodGroup::ONegative, staff_id);
        request.hemoglobin_level = 12.4;

        let outcome = bank.process_donation(request).await.expect("process");
        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            "Hemoglobin level 12.4 g/dL is below the 12.5 g/dL minimum"
        );
    }

    #[tokio::test]
    async fn test_inactive_staff_is_refused() {
        let bank = test_bank().await;
        let donor_id = register_donor(&bank, BloodGroup::OPositive, None).await;
        let staff_id = register_staff(&bank, false).await;

        let outcome = bank
            .process_donation(donation(donor_id, BloodGroup::OPositive, staff_id))
            .await
            .expect("process");

        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            format!("Staff member {staff_id} is not active")
        );
    }

    #[tokio::test]
    async fn test_out_of_range_volume_is_refused() {
        let bank = test_bank().await;
        let donor_id = register_donor(&bank, BloodGroup::OPositive, None).await;
        let staff_id = register_staff(&bank, true).await;

        let mut request = donation(donor_id, BloodGroup::OPositive, staff_id);
        request.quantity_ml = 600;

        let outcome = bank.process_donation(request).await.expect("process");
        assert!(!outcome.success);
        assert_eq!(outcome.message, "quantity_ml must be between 250 and 550");
    }

    #[tokio::test]
    async fn test_outcome_serializes_camel_case() {
        let outcome = DonationOutcome::recorded(7);
        let json = serde_json::to_value(&outcome).expect("serialize");

        assert_eq!(json["success"], true);
        assert_eq!(json["donationId"], 7);
        assert_eq!(json["message"], "Donation recorded successfully.");
    }
}

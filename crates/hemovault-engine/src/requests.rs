//! # Hospital Blood Requests
//!
//! Request lifecycle operations: a hospital registers a request, staff may
//! approve it, and allocation (in [`crate::allocation`]) advances it toward
//! `Fulfilled`. Hospital deactivation lives here too since it is gated on
//! the hospital having no open requests.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use chrono::NaiveDate;
use hemovault_core::error::{CoreError, ValidationError};
use hemovault_core::types::{BloodGroup, NewRequest, UrgencyLevel};
use hemovault_core::units::Units;
use hemovault_core::validation;

use crate::error::EngineResult;
use crate::{today, BloodBank};

// =============================================================================
// Request / Outcome Types
// =============================================================================

/// Input for [`BloodBank::create_request`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBloodRequest {
    /// Requesting hospital.
    pub hospital_id: i64,

    /// Blood group needed.
    pub blood_group: BloodGroup,

    /// Whole units requested.
    pub units_requested: i64,

    /// Date the units are needed by.
    pub required_by_date: NaiveDate,

    /// How urgent the need is.
    pub urgency_level: UrgencyLevel,

    /// Free-text notes, e.g. the ward or case number.
    #[serde(default)]
    pub remarks: Option<String>,
}

/// What happened to a request lifecycle operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOutcome {
    pub success: bool,
    pub message: String,
    pub request_id: Option<i64>,
}

impl RequestOutcome {
    fn created(request_id: i64) -> Self {
        RequestOutcome {
            success: true,
            message: "Request created successfully.".into(),
            request_id: Some(request_id),
        }
    }

    fn approved(request_id: i64) -> Self {
        RequestOutcome {
            success: true,
            message: "Request approved successfully.".into(),
            request_id: Some(request_id),
        }
    }

    fn refused(message: impl Into<String>) -> Self {
        RequestOutcome {
            success: false,
            message: message.into(),
            request_id: None,
        }
    }
}

/// Outcome for operations that carry no created id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub success: bool,
    pub message: String,
}

impl OperationOutcome {
    pub(crate) fn done(message: impl Into<String>) -> Self {
        OperationOutcome {
            success: true,
            message: message.into(),
        }
    }

    pub(crate) fn refused(message: impl Into<String>) -> Self {
        OperationOutcome {
            success: false,
            message: message.into(),
        }
    }
}

// =============================================================================
// Request Lifecycle
// =============================================================================

impl BloodBank {
    /// Registers a new blood request for a hospital.
    ///
    /// The request starts `Pending` with nothing fulfilled. Refused when the
    /// hospital is unknown or deactivated, the unit count is not positive,
    /// or the required-by date is already behind us.
    pub async fn create_request(&self, request: NewBloodRequest) -> EngineResult<RequestOutcome> {
        debug!(
            hospital_id = request.hospital_id,
            blood_group = %request.blood_group,
            units = request.units_requested,
            "Creating blood request"
        );

        let today = today();

        let units = Units::new(request.units_requested);
        if let Err(err) = validation::validate_units_requested(units) {
            return Ok(RequestOutcome::refused(err.to_string()));
        }
        if let Err(err) = validation::validate_required_by_date(request.required_by_date, today) {
            return Ok(RequestOutcome::refused(err.to_string()));
        }

        match self.db.hospitals().get_by_id(request.hospital_id).await? {
            None => {
                return Ok(RequestOutcome::refused(
                    CoreError::NotFound {
                        entity: "Hospital",
                        id: request.hospital_id,
                    }
                    .to_string(),
                ));
            }
            Some(hospital) if !hospital.is_active => {
                return Ok(RequestOutcome::refused(
                    ValidationError::InactiveHospital {
                        hospital_id: request.hospital_id,
                    }
                    .to_string(),
                ));
            }
            Some(_) => {}
        }

        let created = self
            .db
            .requests()
            .insert(&NewRequest {
                hospital_id: request.hospital_id,
                blood_group: request.blood_group,
                units_requested: units,
                request_date: today,
                required_by_date: request.required_by_date,
                urgency_level: request.urgency_level,
                remarks: request.remarks.clone(),
            })
            .await?;

        info!(
            request_id = created.request_id,
            hospital_id = request.hospital_id,
            blood_group = %request.blood_group,
            units = request.units_requested,
            "Blood request created"
        );
        Ok(RequestOutcome::created(created.request_id))
    }

    /// Marks a pending request as approved by the given staff member.
    pub async fn approve_request(
        &self,
        request_id: i64,
        staff_id: i64,
    ) -> EngineResult<RequestOutcome> {
        match self.db.staff().get_by_id(staff_id).await? {
            None => {
                return Ok(RequestOutcome::refused(
                    CoreError::NotFound {
                        entity: "Staff member",
                        id: staff_id,
                    }
                    .to_string(),
                ));
            }
            Some(staff) if !staff.is_active => {
                return Ok(RequestOutcome::refused(
                    ValidationError::InactiveStaff { staff_id }.to_string(),
                ));
            }
            Some(_) => {}
        }

        if self.db.requests().get_by_id(request_id).await?.is_none() {
            return Ok(RequestOutcome::refused(
                CoreError::NotFound {
                    entity: "Request",
                    id: request_id,
                }
                .to_string(),
            ));
        }

        if !self.db.requests().try_approve(request_id, staff_id).await? {
            // Exists but is past Pending, possibly since we looked.
            return Ok(RequestOutcome::refused("Request is not awaiting approval."));
        }

        info!(request_id, staff_id, "Blood request approved");
        Ok(RequestOutcome::approved(request_id))
    }

    /// Deactivates a hospital that has no open requests.
    pub async fn deactivate_hospital(&self, hospital_id: i64) -> EngineResult<OperationOutcome> {
        let Some(hospital) = self.db.hospitals().get_by_id(hospital_id).await? else {
            return Ok(OperationOutcome::refused(
                CoreError::NotFound {
                    entity: "Hospital",
                    id: hospital_id,
                }
                .to_string(),
            ));
        };
        if !hospital.is_active {
            return Ok(OperationOutcome::refused("Hospital is already inactive."));
        }

        if !self.db.hospitals().try_deactivate(hospital_id).await? {
            // Guard refused: open requests, or a concurrent deactivation.
            let still_active = self
                .db
                .hospitals()
                .get_by_id(hospital_id)
                .await?
                .map(|h| h.is_active)
                .unwrap_or(false);
            let message = if still_active {
                "Hospital has unfulfilled requests and cannot be deactivated."
            } else {
                "Hospital is already inactive."
            };
            return Ok(OperationOutcome::refused(message));
        }

        info!(hospital_id, "Hospital deactivated");
        Ok(OperationOutcome::done("Hospital deactivated successfully."))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use hemovault_core::types::{NewHospital, NewStaff, RequestStatus, StaffRole};
    use hemovault_db::{Database, DbConfig};

    async fn test_bank() -> BloodBank {
        let db = Database::new(DbConfig::in_memory()).await.expect("open db");
        BloodBank::new(db)
    }

    async fn register_staff(bank: &BloodBank) -> i64 {
        let staff = bank
            .database()
            .staff()
            .insert(&NewStaff {
                first_name: "Priya".into(),
                last_name: "Sharma".into(),
                email: "priya@example.com".into(),
                phone: "9822033344".into(),
                role: StaffRole::Admin,
                hire_date: chrono::Utc::now().date_naive(),
            })
            .await
            .expect("insert staff");
        staff.staff_id
    }

    async fn register_hospital(bank: &BloodBank, email: &str, license: &str) -> i64 {
        let hospital = bank
            .database()
            .hospitals()
            .insert(&NewHospital {
                hospital_name: "Sunrise Hospital".into(),
                hospital_type: "Multi-specialty".into(),
                contact_person: "Dr. Rao".into(),
                email: email.into(),
                phone: "020-2553300".into(),
                address: "14 MG Road".into(),
                city: "Pune".into(),
                state: "Maharashtra".into(),
                pincode: Some("411001".into()),
                license_number: license.into(),
            })
            .await
            .expect("insert hospital");
        hospital.hospital_id
    }

    fn request(hospital_id: i64, units: i64) -> NewBloodRequest {
        NewBloodRequest {
            hospital_id,
            blood_group: BloodGroup::OPositive,
            units_requested: units,
            required_by_date: chrono::Utc::now().date_naive() + Duration::days(3),
            urgency_level: UrgencyLevel::Urgent,
            remarks: None,
        }
    }

    #[tokio::test]
    async fn test_create_request_starts_pending() {
        let bank = test_bank().await;
        let hospital_id = register_hospital(&bank, "sunrise@example.com", "MH-BB-201").await;

        let outcome = bank
            .create_request(request(hospital_id, 4))
            .await
            .expect("create");

        assert!(outcome.success);
        assert_eq!(outcome.message, "Request created successfully.");
        let request_id = outcome.request_id.expect("id");

        let stored = bank
            .database()
            .requests()
            .get_by_id(request_id)
            .await
            .expect("query")
            .expect("request");
        assert_eq!(stored.request_status, RequestStatus::Pending);
        assert_eq!(stored.units_requested.count(), 4);
        assert_eq!(stored.units_fulfilled.count(), 0);
        assert!(stored.approved_by.is_none());
    }

    #[tokio::test]
    async fn test_create_request_unknown_hospital_refused() {
        let bank = test_bank().await;

        let outcome = bank.create_request(request(99, 2)).await.expect("create");

        assert!(!outcome.success);
        assert_eq!(outcome.message, "Hospital not found: 99");
        assert!(outcome.request_id.is_none());
    }

    #[tokio::test]
    async fn test_create_request_inactive_hospital_refused() {
        let bank = test_bank().await;
        let hospital_id = register_hospital(&bank, "shut@example.com", "MH-BB-202").await;
        assert!(bank
            .database()
            .hospitals()
            .try_deactivate(hospital_id)
            .await
            .expect("deactivate"));

        let outcome = bank
            .create_request(request(hospital_id, 2))
            .await
            .expect("create");

        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            format!("Hospital {hospital_id} is not active")
        );
    }

    #[tokio::test]
    async fn test_create_request_rejects_bad_inputs() {
        let bank = test_bank().await;
        let hospital_id = register_hospital(&bank, "sunrise@example.com", "MH-BB-203").await;

        let outcome = bank
            .create_request(request(hospital_id, 0))
            .await
            .expect("create");
        assert!(!outcome.success);
        assert_eq!(outcome.message, "units_requested must be positive");

        let mut overdue = request(hospital_id, 2);
        overdue.required_by_date = chrono::Utc::now().date_naive() - Duration::days(1);
        let outcome = bank.create_request(overdue).await.expect("create");
        assert!(!outcome.success);
        assert_eq!(outcome.message, "required_by_date must not be in the past");
    }

    #[tokio::test]
    async fn test_approve_request_once() {
        let bank = test_bank().await;
        let staff_id = register_staff(&bank).await;
        let hospital_id = register_hospital(&bank, "sunrise@example.com", "MH-BB-204").await;
        let request_id = bank
            .create_request(request(hospital_id, 3))
            .await
            .expect("create")
            .request_id
            .expect("id");

        let outcome = bank
            .approve_request(request_id, staff_id)
            .await
            .expect("approve");
        assert!(outcome.success);
        assert_eq!(outcome.message, "Request approved successfully.");

        let stored = bank
            .database()
            .requests()
            .get_by_id(request_id)
            .await
            .expect("query")
            .expect("request");
        assert_eq!(stored.request_status, RequestStatus::Approved);
        assert_eq!(stored.approved_by, Some(staff_id));
        assert!(stored.approval_date.is_some());

        // Second approval finds nothing pending.
        let again = bank
            .approve_request(request_id, staff_id)
            .await
            .expect("approve");
        assert!(!again.success);
        assert_eq!(again.message, "Request is not awaiting approval.");
    }

    #[tokio::test]
    async fn test_approve_unknown_request_refused() {
        let bank = test_bank().await;
        let staff_id = register_staff(&bank).await;

        let outcome = bank.approve_request(7, staff_id).await.expect("approve");
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Request not found: 7");
    }

    #[tokio::test]
    async fn test_deactivate_hospital_blocked_by_open_request() {
        let bank = test_bank().await;
        let hospital_id = register_hospital(&bank, "sunrise@example.com", "MH-BB-205").await;
        bank.create_request(request(hospital_id, 2))
            .await
            .expect("create");

        let outcome = bank
            .deactivate_hospital(hospital_id)
            .await
            .expect("deactivate");
        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            "Hospital has unfulfilled requests and cannot be deactivated."
        );

        let hospital = bank
            .database()
            .hospitals()
            .get_by_id(hospital_id)
            .await
            .expect("query")
            .expect("hospital");
        assert!(hospital.is_active);
    }

    #[tokio::test]
    async fn test_deactivate_idle_hospital() {
        let bank = test_bank().await;
        let hospital_id = register_hospital(&bank, "idle@example.com", "MH-BB-206").await;

        let outcome = bank
            .deactivate_hospital(hospital_id)
            .await
            .expect("deactivate");
        assert!(outcome.success);
        assert_eq!(outcome.message, "Hospital deactivated successfully.");

        let again = bank
            .deactivate_hospital(hospital_id)
            .await
            .expect("deactivate");
        assert!(!again.success);
        assert_eq!(again.message, "Hospital is already inactive.");
    }
}

//! # Blood Allocation
//!
//! Allocates shelf stock to an open hospital request and records the
//! transfusion.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      allocate_blood                                     │
//! │                                                                         │
//! │  Screening (reads only)                                                 │
//! │  ┌──────────────┐  ┌─────────────┐  ┌──────────────────────────────┐   │
//! │  │ units / name │→ │ staff       │→ │ request open? units within   │   │
//! │  │ / age shape  │  │ active      │  │ the pending remainder?       │   │
//! │  └──────────────┘  └─────────────┘  └──────────────────────────────┘   │
//! │                                                                         │
//! │  Commit (one transaction)                                               │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────────────┐  │
//! │  │ debit stock    │ → │ insert         │ → │ advance fulfillment    │  │
//! │  │ (conditional)  │   │ transfusion    │   │ (guarded UPDATE)       │  │
//! │  └────────────────┘   └────────────────┘   └────────────────────────┘  │
//! │                                                                         │
//! │  • debit refused        → InsufficientStock outcome, nothing applied    │
//! │  • fulfillment guard    → request moved under us; reload and retry      │
//! │    refused                (bounded), then conflict outcome              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use hemovault_core::error::{CoreError, ValidationError};
use hemovault_core::types::{NewTransfusion, RequestStatus};
use hemovault_core::units::Units;
use hemovault_core::validation;
use hemovault_db::DbResult;

use crate::error::EngineResult;
use crate::{backoff, today, BloodBank, MAX_WRITE_ATTEMPTS};

// =============================================================================
// Request / Outcome Types
// =============================================================================

/// Input for [`BloodBank::allocate_blood`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    /// Open blood request to allocate against.
    pub request_id: i64,

    /// Whole units to allocate in this pass.
    pub units_to_allocate: i64,

    /// Receiving patient's name.
    pub patient_name: String,

    /// Receiving patient's age in years.
    pub patient_age: i64,

    /// Staff member performing the allocation.
    pub staff_id: i64,
}

/// What happened to an allocation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationOutcome {
    pub success: bool,
    pub message: String,
    pub transfusion_id: Option<i64>,
}

impl AllocationOutcome {
    fn allocated(transfusion_id: i64) -> Self {
        AllocationOutcome {
            success: true,
            message: "Blood allocated successfully.".into(),
            transfusion_id: Some(transfusion_id),
        }
    }

    fn refused(message: impl Into<String>) -> Self {
        AllocationOutcome {
            success: false,
            message: message.into(),
            transfusion_id: None,
        }
    }
}

/// One pass of the allocation transaction.
enum AllocationAttempt {
    /// Committed, transfusion id inside.
    Completed(i64),
    /// Refused for a business reason that a retry cannot change.
    Refused(String),
    /// The request moved under us; reload and try again.
    Conflicted,
}

// =============================================================================
// Allocation
// =============================================================================

impl BloodBank {
    /// Allocates `units_to_allocate` units of the request's blood group to
    /// the given request, recording a transfusion for the patient.
    ///
    /// The stock debit carries its sufficiency check inside the UPDATE, so
    /// two concurrent allocations can never drive a group negative: the
    /// slower one sees the reduced balance and is refused. A request that
    /// changes between loading and fulfillment is reloaded and retried a
    /// bounded number of times.
    pub async fn allocate_blood(
        &self,
        request: AllocationRequest,
    ) -> EngineResult<AllocationOutcome> {
        debug!(
            request_id = request.request_id,
            units = request.units_to_allocate,
            "Allocating blood"
        );

        let units = Units::new(request.units_to_allocate);
        if let Err(err) = validation::validate_patient_name(&request.patient_name) {
            return Ok(AllocationOutcome::refused(err.to_string()));
        }
        if let Err(err) = validation::validate_patient_age(request.patient_age) {
            return Ok(AllocationOutcome::refused(err.to_string()));
        }

        match self.db.staff().get_by_id(request.staff_id).await? {
            None => {
                return Ok(AllocationOutcome::refused(
                    CoreError::NotFound {
                        entity: "Staff member",
                        id: request.staff_id,
                    }
                    .to_string(),
                ));
            }
            Some(staff) if !staff.is_active => {
                return Ok(AllocationOutcome::refused(
                    ValidationError::InactiveStaff {
                        staff_id: request.staff_id,
                    }
                    .to_string(),
                ));
            }
            Some(_) => {}
        }

        let mut attempt = 1;
        loop {
            match self.try_allocate(&request, units).await {
                Ok(AllocationAttempt::Completed(transfusion_id)) => {
                    info!(
                        transfusion_id,
                        request_id = request.request_id,
                        units = units.count(),
                        "Blood allocated"
                    );
                    return Ok(AllocationOutcome::allocated(transfusion_id));
                }
                Ok(AllocationAttempt::Refused(message)) => {
                    return Ok(AllocationOutcome::refused(message));
                }
                Ok(AllocationAttempt::Conflicted) if attempt < MAX_WRITE_ATTEMPTS => {
                    warn!(attempt, request_id = request.request_id, "Allocation conflicted, retrying");
                    backoff(attempt).await;
                    attempt += 1;
                }
                Err(err) if err.is_retryable() && attempt < MAX_WRITE_ATTEMPTS => {
                    warn!(attempt, error = %err, "Allocation write conflicted, retrying");
                    backoff(attempt).await;
                    attempt += 1;
                }
                Ok(AllocationAttempt::Conflicted) => {
                    warn!(
                        request_id = request.request_id,
                        "Allocation kept conflicting, giving up"
                    );
                    return Ok(AllocationOutcome::refused(
                        CoreError::ConcurrencyConflict.to_string(),
                    ));
                }
                Err(err) if err.is_retryable() => {
                    return Ok(AllocationOutcome::refused(
                        CoreError::ConcurrencyConflict.to_string(),
                    ));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// One attempt: load the request, then debit, record and fulfill in a
    /// single transaction.
    async fn try_allocate(
        &self,
        request: &AllocationRequest,
        units: Units,
    ) -> DbResult<AllocationAttempt> {
        // Reloaded on every attempt: concurrent allocations move the
        // fulfillment counters.
        let Some(blood_request) = self.db.requests().get_by_id(request.request_id).await? else {
            return Ok(AllocationAttempt::Refused(
                "Request not found or already fulfilled.".into(),
            ));
        };
        if blood_request.request_status == RequestStatus::Fulfilled {
            return Ok(AllocationAttempt::Refused(
                "Request not found or already fulfilled.".into(),
            ));
        }

        // A non-positive ask is an over-allocation of the degenerate kind;
        // both refuse against the current pending remainder.
        let pending = blood_request.units_pending();
        if !units.is_positive() || units > pending {
            return Ok(AllocationAttempt::Refused(
                ValidationError::OverAllocation {
                    requested: units,
                    pending,
                }
                .to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let debited = self
            .db
            .stock()
            .try_debit(&mut *tx, blood_request.blood_group, units, Some(request.staff_id))
            .await?;
        if !debited {
            // Release the transaction before reading the balance for the
            // message; single-connection pools would otherwise starve.
            tx.rollback().await?;
            let entry = self.db.stock().get_by_group(blood_request.blood_group).await?;
            return Ok(AllocationAttempt::Refused(
                CoreError::InsufficientStock {
                    blood_group: blood_request.blood_group,
                    available: entry.units_available,
                    requested: units,
                }
                .to_string(),
            ));
        }

        let transfusion_id = self
            .db
            .transfusions()
            .insert(
                &mut *tx,
                &NewTransfusion {
                    request_id: blood_request.request_id,
                    hospital_id: blood_request.hospital_id,
                    blood_group: blood_request.blood_group,
                    units_transfused: units,
                    quantity_ml: units.volume_ml(),
                    transfusion_date: today(),
                    patient_name: Some(request.patient_name.clone()),
                    patient_age: Some(request.patient_age),
                    staff_id: Some(request.staff_id),
                    remarks: None,
                },
            )
            .await?;

        let fulfilled = self
            .db
            .requests()
            .try_fulfill(&mut *tx, blood_request.request_id, units)
            .await?;
        if !fulfilled {
            // The guarded UPDATE matched nothing: someone fulfilled ahead
            // of us. Roll the debit back and let the caller reload.
            tx.rollback().await?;
            return Ok(AllocationAttempt::Conflicted);
        }

        tx.commit().await?;
        Ok(AllocationAttempt::Completed(transfusion_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use hemovault_core::types::{BloodGroup, NewHospital, NewRequest, NewStaff, StaffRole, UrgencyLevel};
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
                first_name: "Isha".into(),
                last_name: "Kulkarni".into(),
                email: "isha@example.com".into(),
                phone: "9822011122".into(),
                role: StaffRole::Nurse,
                hire_date: chrono::Utc::now().date_naive(),
            })
            .await
            .expect("insert staff");
        staff.staff_id
    }

    async fn register_hospital(bank: &BloodBank) -> i64 {
        let hospital = bank
            .database()
            .hospitals()
            .insert(&NewHospital {
                hospital_name: "City Care Hospital".into(),
                hospital_type: "Multi-specialty".into(),
                contact_person: "Dr. Rao".into(),
                email: "citycare@example.com".into(),
                phone: "020-2553300".into(),
                address: "14 MG Road".into(),
                city: "Pune".into(),
                state: "Maharashtra".into(),
                pincode: Some("411001".into()),
                license_number: "MH-BB-101".into(),
            })
            .await
            .expect("insert hospital");
        hospital.hospital_id
    }

    async fn open_request(
        bank: &BloodBank,
        hospital_id: i64,
        blood_group: BloodGroup,
        units: i64,
    ) -> i64 {
        let today = chrono::Utc::now().date_naive();
        let request = bank
            .database()
            .requests()
            .insert(&NewRequest {
                hospital_id,
                blood_group,
                units_requested: Units::new(units),
                request_date: today,
                required_by_date: today + Duration::days(5),
                urgency_level: UrgencyLevel::Urgent,
                remarks: None,
            })
            .await
            .expect("insert request");
        request.request_id
    }

    async fn shelve(bank: &BloodBank, blood_group: BloodGroup, units: i64) {
        let mut conn = bank.database().pool().acquire().await.expect("conn");
        bank.database()
            .stock()
            .credit(&mut conn, blood_group, Units::new(units), None)
            .await
            .expect("credit");
    }

    async fn units_on_shelf(bank: &BloodBank, blood_group: BloodGroup) -> i64 {
        bank.database()
            .stock()
            .get_by_group(blood_group)
            .await
            .expect("stock")
            .units_available
            .count()
    }

    fn allocation(request_id: i64, units: i64, staff_id: i64) -> AllocationRequest {
        AllocationRequest {
            request_id,
            units_to_allocate: units,
            patient_name: "Rohan Iyer".into(),
            patient_age: 34,
            staff_id,
        }
    }

    #[tokio::test]
    async fn test_allocation_debits_stock_and_records_transfusion() {
        let bank = test_bank().await;
        let staff_id = register_staff(&bank).await;
        let hospital_id = register_hospital(&bank).await;
        let request_id = open_request(&bank, hospital_id, BloodGroup::APositive, 4).await;
        shelve(&bank, BloodGroup::APositive, 10).await;

        let outcome = bank
            .allocate_blood(allocation(request_id, 3, staff_id))
            .await
            .expect("allocate");

        assert!(outcome.success);
        assert_eq!(outcome.message, "Blood allocated successfully.");
        assert_eq!(units_on_shelf(&bank, BloodGroup::APositive).await, 7);

        let transfusions = bank
            .database()
            .transfusions()
            .list_for_request(request_id)
            .await
            .expect("transfusions");
        assert_eq!(transfusions.len(), 1);
        assert_eq!(transfusions[0].units_transfused.count(), 3);
        assert_eq!(transfusions[0].quantity_ml, 3 * 450);
        assert_eq!(transfusions[0].patient_name.as_deref(), Some("Rohan Iyer"));

        let request = bank
            .database()
            .requests()
            .get_by_id(request_id)
            .await
            .expect("query")
            .expect("request");
        assert_eq!(request.units_fulfilled.count(), 3);
        assert_eq!(request.request_status, RequestStatus::PartiallyFulfilled);
    }

    #[tokio::test]
    async fn test_final_allocation_marks_request_fulfilled() {
        let bank = test_bank().await;
        let staff_id = register_staff(&bank).await;
        let hospital_id = register_hospital(&bank).await;
        let request_id = open_request(&bank, hospital_id, BloodGroup::ONegative, 4).await;
        shelve(&bank, BloodGroup::ONegative, 6).await;

        let first = bank
            .allocate_blood(allocation(request_id, 2, staff_id))
            .await
            .expect("allocate");
        assert!(first.success);

        let second = bank
            .allocate_blood(allocation(request_id, 2, staff_id))
            .await
            .expect("allocate");
        assert!(second.success);

        let request = bank
            .database()
            .requests()
            .get_by_id(request_id)
            .await
            .expect("query")
            .expect("request");
        assert_eq!(request.request_status, RequestStatus::Fulfilled);
        assert_eq!(request.units_fulfilled.count(), 4);
        assert_eq!(units_on_shelf(&bank, BloodGroup::ONegative).await, 2);

        // Terminal: further allocations are turned away.
        let third = bank
            .allocate_blood(allocation(request_id, 1, staff_id))
            .await
            .expect("allocate");
        assert!(!third.success);
        assert_eq!(third.message, "Request not found or already fulfilled.");
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_everything_unchanged() {
        let bank = test_bank().await;
        let staff_id = register_staff(&bank).await;
        let hospital_id = register_hospital(&bank).await;
        let request_id = open_request(&bank, hospital_id, BloodGroup::ABNegative, 5).await;
        shelve(&bank, BloodGroup::ABNegative, 2).await;

        let outcome = bank
            .allocate_blood(allocation(request_id, 3, staff_id))
            .await
            .expect("allocate");

        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            "Insufficient stock for AB-: available 2, requested 3"
        );
        assert!(outcome.transfusion_id.is_none());

        assert_eq!(units_on_shelf(&bank, BloodGroup::ABNegative).await, 2);
        let request = bank
            .database()
            .requests()
            .get_by_id(request_id)
            .await
            .expect("query")
            .expect("request");
        assert_eq!(request.units_fulfilled.count(), 0);
        assert_eq!(request.request_status, RequestStatus::Pending);
        let transfusions = bank
            .database()
            .transfusions()
            .list_for_request(request_id)
            .await
            .expect("transfusions");
        assert!(transfusions.is_empty());
    }

    #[tokio::test]
    async fn test_over_allocation_is_refused_without_debit() {
        let bank = test_bank().await;
        let staff_id = register_staff(&bank).await;
        let hospital_id = register_hospital(&bank).await;
        let request_id = open_request(&bank, hospital_id, BloodGroup::BPositive, 2).await;
        shelve(&bank, BloodGroup::BPositive, 50).await;

        let outcome = bank
            .allocate_blood(allocation(request_id, 3, staff_id))
            .await
            .expect("allocate");

        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            "Cannot allocate 3 unit(s): only 2 pending on this request"
        );
        assert_eq!(units_on_shelf(&bank, BloodGroup::BPositive).await, 50);
    }

    #[tokio::test]
    async fn test_unknown_request_is_refused() {
        let bank = test_bank().await;
        let staff_id = register_staff(&bank).await;

        let outcome = bank
            .allocate_blood(allocation(424242, 1, staff_id))
            .await
            .expect("allocate");

        assert!(!outcome.success);
        assert_eq!(outcome.message, "Request not found or already fulfilled.");
    }

    #[tokio::test]
    async fn test_zero_units_is_refused() {
        let bank = test_bank().await;
        let staff_id = register_staff(&bank).await;
        let hospital_id = register_hospital(&bank).await;
        let request_id = open_request(&bank, hospital_id, BloodGroup::OPositive, 2).await;

        let outcome = bank
            .allocate_blood(allocation(request_id, 0, staff_id))
            .await
            .expect("allocate");

        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            "Cannot allocate 0 unit(s): only 2 pending on this request"
        );
    }

    #[tokio::test]
    async fn test_patient_age_out_of_range_is_refused() {
        let bank = test_bank().await;
        let staff_id = register_staff(&bank).await;
        let hospital_id = register_hospital(&bank).await;
        let request_id = open_request(&bank, hospital_id, BloodGroup::OPositive, 2).await;

        let mut request = allocation(request_id, 1, staff_id);
        request.patient_age = 130;

        let outcome = bank.allocate_blood(request).await.expect("allocate");
        assert!(!outcome.success);
        assert_eq!(outcome.message, "patient_age must be between 1 and 120");
    }

    // In-memory SQLite is capped at one connection, so the contention tests
    // run against a throwaway file-backed database.
    async fn file_backed_bank() -> (BloodBank, tempfile::NamedTempFile) {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let db = Database::new(DbConfig::new(file.path()))
            .await
            .expect("open db");
        (BloodBank::new(db), file)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_allocations_never_oversell() {
        let (bank, _file) = file_backed_bank().await;
        let staff_id = register_staff(&bank).await;
        let hospital_id = register_hospital(&bank).await;
        shelve(&bank, BloodGroup::OPositive, 5).await;

        let mut request_ids = Vec::new();
        for _ in 0..10 {
            request_ids.push(open_request(&bank, hospital_id, BloodGroup::OPositive, 1).await);
        }

        let mut handles = Vec::new();
        for request_id in request_ids {
            let bank = bank.clone();
            handles.push(tokio::spawn(async move {
                bank.allocate_blood(allocation(request_id, 1, staff_id)).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            let outcome = handle.await.expect("join").expect("allocate");
            if outcome.success {
                successes += 1;
            }
        }

        // Five units on the shelf: exactly five of the ten contenders get
        // one, and the ledger never goes negative.
        assert_eq!(successes, 5);
        assert_eq!(units_on_shelf(&bank, BloodGroup::OPositive).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_contended_request_is_fulfilled_exactly_once() {
        let (bank, _file) = file_backed_bank().await;
        let staff_id = register_staff(&bank).await;
        let hospital_id = register_hospital(&bank).await;
        let request_id = open_request(&bank, hospital_id, BloodGroup::APositive, 1).await;
        shelve(&bank, BloodGroup::APositive, 10).await;

        let mut handles = Vec::new();
        for _ in 0..4 {
            let bank = bank.clone();
            handles.push(tokio::spawn(async move {
                bank.allocate_blood(allocation(request_id, 1, staff_id)).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            let outcome = handle.await.expect("join").expect("allocate");
            if outcome.success {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(units_on_shelf(&bank, BloodGroup::APositive).await, 9);

        let request = bank
            .database()
            .requests()
            .get_by_id(request_id)
            .await
            .expect("query")
            .expect("request");
        assert_eq!(request.request_status, RequestStatus::Fulfilled);
        assert_eq!(request.units_fulfilled.count(), 1);

        let transfusions = bank
            .database()
            .transfusions()
            .list_for_request(request_id)
            .await
            .expect("transfusions");
        assert_eq!(transfusions.len(), 1);
    }
}

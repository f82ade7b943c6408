//! # Request Repository
//!
//! Database operations for hospital blood requests.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Request Lifecycle                                  │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── insert() → BloodRequest { status: Pending, fulfilled: 0 }      │
//! │                                                                         │
//! │  2. (OPTIONAL) APPROVE                                                 │
//! │     └── approve() → status: Approved, stamps approver                  │
//! │                                                                         │
//! │  3. ALLOCATE (repeats until fully fulfilled)                           │
//! │     └── try_fulfill() → fulfilled += n                                 │
//! │         status: Partially Fulfilled │ Fulfilled (derived in SQL)       │
//! │         (runs inside the allocation transaction, next to the           │
//! │          stock debit and the transfusion insert)                       │
//! │                                                                         │
//! │  Fulfilled is terminal: the fulfillment UPDATE refuses rows already    │
//! │  at Fulfilled and refuses totals that would overshoot the request.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use hemovault_core::views::PendingRequestRow;
use hemovault_core::{
    BloodGroup, BloodRequest, DeadlineStatus, NewRequest, RequestStatus, Units, UrgencyLevel,
};

/// Raw joined row for the pending request work queue.
#[derive(sqlx::FromRow)]
struct PendingRequestRecord {
    request_id: i64,
    hospital_name: String,
    city: String,
    blood_group: BloodGroup,
    units_requested: Units,
    units_fulfilled: Units,
    urgency_level: UrgencyLevel,
    request_status: RequestStatus,
    request_date: NaiveDate,
    required_by_date: NaiveDate,
}

/// Repository for blood request database operations.
#[derive(Debug, Clone)]
pub struct RequestRepository {
    pool: SqlitePool,
}

impl RequestRepository {
    /// Creates a new RequestRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RequestRepository { pool }
    }

    /// Creates a new request in Pending state with nothing fulfilled.
    pub async fn insert(&self, request: &NewRequest) -> DbResult<BloodRequest> {
        let now = Utc::now();

        debug!(
            hospital_id = request.hospital_id,
            blood_group = %request.blood_group,
            units = request.units_requested.count(),
            "Creating blood request"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO blood_requests (
                hospital_id, blood_group, units_requested, units_fulfilled,
                request_date, required_by_date, urgency_level, request_status,
                approved_by, approval_date, remarks, created_at
            ) VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, 'Pending', NULL, NULL, ?7, ?8)
            "#,
        )
        .bind(request.hospital_id)
        .bind(request.blood_group)
        .bind(request.units_requested)
        .bind(request.request_date)
        .bind(request.required_by_date)
        .bind(request.urgency_level)
        .bind(&request.remarks)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(BloodRequest {
            request_id: result.last_insert_rowid(),
            hospital_id: request.hospital_id,
            blood_group: request.blood_group,
            units_requested: request.units_requested,
            units_fulfilled: Units::zero(),
            request_date: request.request_date,
            required_by_date: request.required_by_date,
            urgency_level: request.urgency_level,
            request_status: RequestStatus::Pending,
            approved_by: None,
            approval_date: None,
            remarks: request.remarks.clone(),
            created_at: now,
        })
    }

    /// Gets a request by ID.
    pub async fn get_by_id(&self, request_id: i64) -> DbResult<Option<BloodRequest>> {
        let request: Option<BloodRequest> = sqlx::query_as(
            r#"
            SELECT
                request_id, hospital_id, blood_group,
                units_requested, units_fulfilled,
                request_date, required_by_date, urgency_level, request_status,
                approved_by, approval_date, remarks, created_at
            FROM blood_requests
            WHERE request_id = ?1
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// Attempts to record fulfilled units inside the caller's transaction.
    ///
    /// The counter bump, the overshoot guard, and the status transition are
    /// one UPDATE: a concurrent allocation that would push the total past
    /// `units_requested` matches no row instead of corrupting the counters.
    ///
    /// ## Returns
    /// * `Ok(true)` - units recorded; status moved to Partially Fulfilled or
    ///   Fulfilled as the new total dictates
    /// * `Ok(false)` - request missing, already Fulfilled, or the units would
    ///   overshoot; nothing changed
    pub async fn try_fulfill(
        &self,
        conn: &mut SqliteConnection,
        request_id: i64,
        units: Units,
    ) -> DbResult<bool> {
        debug!(request_id, units = units.count(), "Recording fulfillment");

        let result = sqlx::query(
            r#"
            UPDATE blood_requests SET
                units_fulfilled = units_fulfilled + ?1,
                request_status = CASE
                    WHEN units_fulfilled + ?1 >= units_requested THEN 'Fulfilled'
                    ELSE 'Partially Fulfilled'
                END
            WHERE request_id = ?2
              AND request_status != 'Fulfilled'
              AND units_fulfilled + ?1 <= units_requested
            "#,
        )
        .bind(units)
        .bind(request_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Attempts to approve a Pending request.
    ///
    /// ## Returns
    /// * `Ok(true)` - request was Pending; now Approved with approver stamped
    /// * `Ok(false)` - request missing or not Pending anymore
    pub async fn try_approve(&self, request_id: i64, staff_id: i64) -> DbResult<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE blood_requests SET
                request_status = 'Approved',
                approved_by = ?1,
                approval_date = ?2
            WHERE request_id = ?3 AND request_status = 'Pending'
            "#,
        )
        .bind(staff_id)
        .bind(now)
        .bind(request_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Open requests joined with hospital name and city, most urgent first.
    ///
    /// Ordering is urgency rank (Critical, Urgent, Normal) then the nearest
    /// required-by date; `deadline_status` is derived against `today`.
    pub async fn pending_with_hospital(&self, today: NaiveDate) -> DbResult<Vec<PendingRequestRow>> {
        let records: Vec<PendingRequestRecord> = sqlx::query_as(
            r#"
            SELECT
                r.request_id,
                h.hospital_name,
                h.city,
                r.blood_group,
                r.units_requested,
                r.units_fulfilled,
                r.urgency_level,
                r.request_status,
                r.request_date,
                r.required_by_date
            FROM blood_requests r
            JOIN hospitals h ON h.hospital_id = r.hospital_id
            WHERE r.request_status != 'Fulfilled'
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut rows: Vec<PendingRequestRow> = records
            .into_iter()
            .map(|r| PendingRequestRow {
                request_id: r.request_id,
                hospital_name: r.hospital_name,
                city: r.city,
                blood_group: r.blood_group,
                units_requested: r.units_requested,
                units_fulfilled: r.units_fulfilled,
                units_pending: r.units_requested - r.units_fulfilled,
                urgency_level: r.urgency_level,
                request_status: r.request_status,
                request_date: r.request_date,
                required_by_date: r.required_by_date,
                deadline_status: DeadlineStatus::derive(r.required_by_date, today),
            })
            .collect();

        rows.sort_by_key(|r| (r.urgency_level.rank(), r.required_by_date));

        Ok(rows)
    }

    /// Total requests not yet fully fulfilled.
    pub async fn count_open(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM blood_requests WHERE request_status != 'Fulfilled'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Hospital Repository
//!
//! Database operations for the hospital registry. Requests reference
//! hospitals; a hospital with open requests cannot be deactivated.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use hemovault_core::{Hospital, NewHospital};

/// Repository for hospital database operations.
#[derive(Debug, Clone)]
pub struct HospitalRepository {
    pool: SqlitePool,
}

impl HospitalRepository {
    /// Creates a new HospitalRepository.
    pub fn new(pool: SqlitePool) -> Self {
        HospitalRepository { pool }
    }

    /// Registers a new hospital (active by default).
    pub async fn insert(&self, hospital: &NewHospital) -> DbResult<Hospital> {
        let now = Utc::now();
        let today = now.date_naive();

        debug!(name = %hospital.hospital_name, "Registering hospital");

        let result = sqlx::query(
            r#"
            INSERT INTO hospitals (
                hospital_name, hospital_type, contact_person,
                email, phone, address, city, state, pincode,
                license_number, is_active, registered_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11, ?12)
            "#,
        )
        .bind(&hospital.hospital_name)
        .bind(&hospital.hospital_type)
        .bind(&hospital.contact_person)
        .bind(&hospital.email)
        .bind(&hospital.phone)
        .bind(&hospital.address)
        .bind(&hospital.city)
        .bind(&hospital.state)
        .bind(&hospital.pincode)
        .bind(&hospital.license_number)
        .bind(today)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Hospital {
            hospital_id: result.last_insert_rowid(),
            hospital_name: hospital.hospital_name.clone(),
            hospital_type: hospital.hospital_type.clone(),
            contact_person: hospital.contact_person.clone(),
            email: hospital.email.clone(),
            phone: hospital.phone.clone(),
            address: hospital.address.clone(),
            city: hospital.city.clone(),
            state: hospital.state.clone(),
            pincode: hospital.pincode.clone(),
            license_number: hospital.license_number.clone(),
            is_active: true,
            registered_date: today,
            created_at: now,
        })
    }

    /// Gets a hospital by ID.
    pub async fn get_by_id(&self, hospital_id: i64) -> DbResult<Option<Hospital>> {
        let hospital: Option<Hospital> = sqlx::query_as(
            r#"
            SELECT
                hospital_id, hospital_name, hospital_type, contact_person,
                email, phone, address, city, state, pincode,
                license_number, is_active, registered_date, created_at
            FROM hospitals
            WHERE hospital_id = ?1
            "#,
        )
        .bind(hospital_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(hospital)
    }

    /// Attempts to deactivate a hospital.
    ///
    /// ## Returns
    /// * `Ok(true)` - hospital was active with no open requests; deactivated
    /// * `Ok(false)` - hospital missing, already inactive, or it still has
    ///   unfulfilled requests
    ///
    /// The open-request guard is part of the UPDATE itself, so a request
    /// created concurrently cannot slip past it.
    pub async fn try_deactivate(&self, hospital_id: i64) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE hospitals SET is_active = 0
            WHERE hospital_id = ?1
              AND is_active = 1
              AND NOT EXISTS (
                  SELECT 1 FROM blood_requests
                  WHERE hospital_id = ?1 AND request_status != 'Fulfilled'
              )
            "#,
        )
        .bind(hospital_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Total active hospitals.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM hospitals WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Staff Repository
//!
//! Database operations for the staff registry. Donations and approvals
//! reference staff rows; the write paths check `is_active` before accepting
//! a staff id.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use hemovault_core::{NewStaff, Staff};

/// Repository for staff database operations.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    /// Creates a new StaffRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    /// Registers a new staff member (active by default).
    pub async fn insert(&self, staff: &NewStaff) -> DbResult<Staff> {
        let now = Utc::now();

        debug!(email = %staff.email, "Registering staff member");

        let result = sqlx::query(
            r#"
            INSERT INTO staff (
                first_name, last_name, email, phone,
                role, hire_date, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)
            "#,
        )
        .bind(&staff.first_name)
        .bind(&staff.last_name)
        .bind(&staff.email)
        .bind(&staff.phone)
        .bind(staff.role)
        .bind(staff.hire_date)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Staff {
            staff_id: result.last_insert_rowid(),
            first_name: staff.first_name.clone(),
            last_name: staff.last_name.clone(),
            email: staff.email.clone(),
            phone: staff.phone.clone(),
            role: staff.role,
            hire_date: staff.hire_date,
            is_active: true,
            created_at: now,
        })
    }

    /// Gets a staff member by ID.
    pub async fn get_by_id(&self, staff_id: i64) -> DbResult<Option<Staff>> {
        let staff: Option<Staff> = sqlx::query_as(
            r#"
            SELECT
                staff_id, first_name, last_name, email, phone,
                role, hire_date, is_active, created_at
            FROM staff
            WHERE staff_id = ?1
            "#,
        )
        .bind(staff_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(staff)
    }

    /// Deactivates a staff member. They stay in the registry for audit
    /// references but can no longer collect donations or approve requests.
    pub async fn deactivate(&self, staff_id: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE staff SET is_active = 0 WHERE staff_id = ?1")
            .bind(staff_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", staff_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

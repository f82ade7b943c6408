//! # Donor Repository
//!
//! Database operations for the donor registry.
//!
//! ## Donor Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Donor Lifecycle                                    │
//! │                                                                         │
//! │  1. REGISTER                                                           │
//! │     └── insert() → Donor { total_donations: 0 }                        │
//! │                                                                         │
//! │  2. DONATE (repeats, at least 90 days apart)                           │
//! │     └── record_donation() → last_donation_date = today                 │
//! │                             total_donations += 1                       │
//! │                             is_eligible = false                        │
//! │         (runs inside the donation transaction, next to the stock       │
//! │          credit and the donation row insert)                           │
//! │                                                                         │
//! │  The stored is_eligible flag is a snapshot; reads re-derive            │
//! │  eligibility from last_donation_date so it never goes stale.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use hemovault_core::views::DonorSummaryRow;
use hemovault_core::{eligibility, Donor, NewDonor};

/// Repository for donor database operations.
#[derive(Debug, Clone)]
pub struct DonorRepository {
    pool: SqlitePool,
}

impl DonorRepository {
    /// Creates a new DonorRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DonorRepository { pool }
    }

    /// Registers a new donor.
    ///
    /// The initial eligibility flag is derived from `last_donation_date`
    /// (a donor imported with a recent donation starts ineligible).
    pub async fn insert(&self, donor: &NewDonor) -> DbResult<Donor> {
        let now = Utc::now();
        let today = now.date_naive();
        let is_eligible = eligibility::is_eligible(donor.last_donation_date, today);

        debug!(email = %donor.email, blood_group = %donor.blood_group, "Registering donor");

        let result = sqlx::query(
            r#"
            INSERT INTO donors (
                first_name, last_name, email, phone,
                blood_group, date_of_birth, gender,
                address, city, state, pincode,
                last_donation_date, total_donations, is_eligible,
                registered_date, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14,
                ?15, ?16
            )
            "#,
        )
        .bind(&donor.first_name)
        .bind(&donor.last_name)
        .bind(&donor.email)
        .bind(&donor.phone)
        .bind(donor.blood_group)
        .bind(donor.date_of_birth)
        .bind(&donor.gender)
        .bind(&donor.address)
        .bind(&donor.city)
        .bind(&donor.state)
        .bind(&donor.pincode)
        .bind(donor.last_donation_date)
        .bind(0i64)
        .bind(is_eligible)
        .bind(today)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Donor {
            donor_id: result.last_insert_rowid(),
            first_name: donor.first_name.clone(),
            last_name: donor.last_name.clone(),
            email: donor.email.clone(),
            phone: donor.phone.clone(),
            blood_group: donor.blood_group,
            date_of_birth: donor.date_of_birth,
            gender: donor.gender.clone(),
            address: donor.address.clone(),
            city: donor.city.clone(),
            state: donor.state.clone(),
            pincode: donor.pincode.clone(),
            last_donation_date: donor.last_donation_date,
            total_donations: 0,
            is_eligible,
            registered_date: today,
            created_at: now,
        })
    }

    /// Gets a donor by ID.
    pub async fn get_by_id(&self, donor_id: i64) -> DbResult<Option<Donor>> {
        let donor: Option<Donor> = sqlx::query_as(
            r#"
            SELECT
                donor_id, first_name, last_name, email, phone,
                blood_group, date_of_birth, gender,
                address, city, state, pincode,
                last_donation_date, total_donations, is_eligible,
                registered_date, created_at
            FROM donors
            WHERE donor_id = ?1
            "#,
        )
        .bind(donor_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(donor)
    }

    /// Marks a completed donation on the donor inside the caller's
    /// transaction.
    ///
    /// Sets `last_donation_date`, bumps the lifetime counter, and clears the
    /// eligibility snapshot (the 90-day window restarts today).
    pub async fn record_donation(
        &self,
        conn: &mut SqliteConnection,
        donor_id: i64,
        donation_date: NaiveDate,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE donors SET
                last_donation_date = ?1,
                total_donations = total_donations + 1,
                is_eligible = 0
            WHERE donor_id = ?2
            "#,
        )
        .bind(donation_date)
        .bind(donor_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Donor", donor_id));
        }

        Ok(())
    }

    /// Donor roster with live-derived eligibility, ordered by name.
    pub async fn summaries(&self, today: NaiveDate) -> DbResult<Vec<DonorSummaryRow>> {
        let donors: Vec<Donor> = sqlx::query_as(
            r#"
            SELECT
                donor_id, first_name, last_name, email, phone,
                blood_group, date_of_birth, gender,
                address, city, state, pincode,
                last_donation_date, total_donations, is_eligible,
                registered_date, created_at
            FROM donors
            ORDER BY first_name, last_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(donors
            .iter()
            .map(|d| DonorSummaryRow::from_donor(d, today))
            .collect())
    }

    /// Total registered donors.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM donors")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use hemovault_core::BloodGroup;

    fn sample_donor(email: &str) -> NewDonor {
        NewDonor {
            first_name: "Arjun".to_string(),
            last_name: "Patel".to_string(),
            email: email.to_string(),
            phone: "9876543210".to_string(),
            blood_group: BloodGroup::OPositive,
            date_of_birth: NaiveDate::from_ymd_opt(1992, 7, 14).unwrap(),
            gender: "Male".to_string(),
            address: None,
            city: Some("Pune".to_string()),
            state: Some("Maharashtra".to_string()),
            pincode: None,
            last_donation_date: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let donors = db.donors();

        let created = donors.insert(&sample_donor("arjun@example.com")).await.unwrap();
        assert!(created.donor_id > 0);
        assert!(created.is_eligible);
        assert_eq!(created.total_donations, 0);

        let fetched = donors.get_by_id(created.donor_id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "arjun@example.com");
        assert_eq!(fetched.blood_group, BloodGroup::OPositive);
        assert_eq!(fetched.last_donation_date, None);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let donors = db.donors();

        donors.insert(&sample_donor("dup@example.com")).await.unwrap();
        let err = donors.insert(&sample_donor("dup@example.com")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_record_donation_updates_counters() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let donors = db.donors();

        let created = donors.insert(&sample_donor("counter@example.com")).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        donors
            .record_donation(&mut tx, created.donor_id, date)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let fetched = donors.get_by_id(created.donor_id).await.unwrap().unwrap();
        assert_eq!(fetched.last_donation_date, Some(date));
        assert_eq!(fetched.total_donations, 1);
        assert!(!fetched.is_eligible);
    }

    #[tokio::test]
    async fn test_record_donation_unknown_donor() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        let err = db
            .donors()
            .record_donation(&mut tx, 999, NaiveDate::from_ymd_opt(2025, 6, 15).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_summaries_derive_live_eligibility() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let donors = db.donors();

        let created = donors.insert(&sample_donor("live@example.com")).await.unwrap();
        let donated = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        donors
            .record_donation(&mut tx, created.donor_id, donated)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        // 90 days later the stored flag still says ineligible, the row says
        // eligible
        let today = NaiveDate::from_ymd_opt(2025, 5, 30).unwrap();
        let rows = donors.summaries(today).await.unwrap();
        let row = rows.iter().find(|r| r.donor_id == created.donor_id).unwrap();
        assert!(row.is_eligible);
        assert_eq!(row.eligibility_status, "Eligible");
    }
}

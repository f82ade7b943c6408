//! # Donation Repository
//!
//! Database operations for donation records.
//!
//! ## Donation Intake
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Donation Write Path (one transaction)                   │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. donations.insert()      → new Completed donation row             │
//! │    2. stock.credit()          → +1 unit-equivalent for the group       │
//! │    3. donors.record_donation() → last_donation_date, counter, flag     │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  All three or none: a crash between steps can never leave a banked     │
//! │  donation that no stock reflects.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The monthly report is a single grouped aggregation over Completed
//! donations, so every line of one report comes from the same snapshot.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use hemovault_core::views::{MonthlyDonationRow, RecentDonationRow};
use hemovault_core::{BloodGroup, DonationStatus, NewDonation};

/// Raw joined row for the recent donation feed.
#[derive(sqlx::FromRow)]
struct RecentDonationRecord {
    donation_id: i64,
    donor_name: String,
    blood_group: BloodGroup,
    quantity_ml: i64,
    donation_date: chrono::NaiveDate,
    hemoglobin_level: Option<f64>,
    donation_status: DonationStatus,
    staff_name: Option<String>,
}

/// Raw aggregation row for the monthly report.
#[derive(sqlx::FromRow)]
struct MonthlyAggregateRecord {
    blood_group: BloodGroup,
    total_donations: i64,
    total_quantity_ml: i64,
    unique_donors: i64,
}

/// Repository for donation database operations.
#[derive(Debug, Clone)]
pub struct DonationRepository {
    pool: SqlitePool,
}

impl DonationRepository {
    /// Creates a new DonationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DonationRepository { pool }
    }

    /// Inserts a donation row inside the caller's transaction.
    ///
    /// ## Returns
    /// The generated donation id.
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        donation: &NewDonation,
    ) -> DbResult<i64> {
        debug!(
            donor_id = donation.donor_id,
            blood_group = %donation.blood_group,
            quantity_ml = donation.quantity_ml,
            "Inserting donation"
        );

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO donations (
                donor_id, donation_date, blood_group, quantity_ml,
                hemoglobin_level, blood_pressure, donation_status,
                staff_id, remarks, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(donation.donor_id)
        .bind(donation.donation_date)
        .bind(donation.blood_group)
        .bind(donation.quantity_ml)
        .bind(donation.hemoglobin_level)
        .bind(&donation.blood_pressure)
        .bind(donation.donation_status)
        .bind(donation.staff_id)
        .bind(&donation.remarks)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Latest donations joined with donor and staff names, newest first.
    pub async fn recent_with_names(&self, limit: i64) -> DbResult<Vec<RecentDonationRow>> {
        let records: Vec<RecentDonationRecord> = sqlx::query_as(
            r#"
            SELECT
                d.donation_id,
                dn.first_name || ' ' || dn.last_name AS donor_name,
                d.blood_group,
                d.quantity_ml,
                d.donation_date,
                d.hemoglobin_level,
                d.donation_status,
                s.first_name || ' ' || s.last_name AS staff_name
            FROM donations d
            JOIN donors dn ON dn.donor_id = d.donor_id
            LEFT JOIN staff s ON s.staff_id = d.staff_id
            ORDER BY d.donation_date DESC, d.donation_id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records
            .into_iter()
            .map(|r| RecentDonationRow {
                donation_id: r.donation_id,
                donor_name: r.donor_name,
                blood_group: r.blood_group,
                quantity_ml: r.quantity_ml,
                donation_date: r.donation_date,
                hemoglobin_level: r.hemoglobin_level,
                donation_status: r.donation_status,
                staff_name: r.staff_name,
            })
            .collect())
    }

    /// Per-group aggregation of Completed donations in one calendar month.
    ///
    /// One query, one snapshot: counts, volume, and distinct donors for a
    /// group always agree with each other. Groups with no donations that
    /// month simply have no line.
    pub async fn monthly_summary(&self, year: i32, month: u32) -> DbResult<Vec<MonthlyDonationRow>> {
        let records: Vec<MonthlyAggregateRecord> = sqlx::query_as(
            r#"
            SELECT
                blood_group,
                COUNT(*) AS total_donations,
                SUM(quantity_ml) AS total_quantity_ml,
                COUNT(DISTINCT donor_id) AS unique_donors
            FROM donations
            WHERE donation_status = 'Completed'
              AND strftime('%Y', donation_date) = ?1
              AND strftime('%m', donation_date) = ?2
            GROUP BY blood_group
            "#,
        )
        .bind(format!("{year:04}"))
        .bind(format!("{month:02}"))
        .fetch_all(&self.pool)
        .await?;

        let mut rows: Vec<MonthlyDonationRow> = records
            .into_iter()
            .map(|r| {
                MonthlyDonationRow::new(
                    r.blood_group,
                    r.total_donations,
                    r.total_quantity_ml,
                    r.unique_donors,
                )
            })
            .collect();

        // TEXT collation puts AB+ between A- and B+; report in display order
        rows.sort_by_key(|r| {
            BloodGroup::ALL
                .iter()
                .position(|g| *g == r.blood_group)
                .unwrap_or(BloodGroup::ALL.len())
        });

        Ok(rows)
    }

    /// Total Completed donations.
    pub async fn count_completed(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM donations WHERE donation_status = 'Completed'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Stock Repository
//!
//! The blood stock ledger: one row per blood group, moved only by UPDATEs.
//!
//! ## Ledger Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Stock Ledger Movements                             │
//! │                                                                         │
//! │  CREDIT (donation banked)                                              │
//! │     └── UPDATE units_available = units_available + N                   │
//! │         Always succeeds for a known blood group                        │
//! │                                                                         │
//! │  DEBIT (allocation)                                                    │
//! │     └── UPDATE ... SET units_available = units_available - N           │
//! │         WHERE blood_group = ? AND units_available >= N                 │
//! │                              ───────────────────────────               │
//! │         The sufficiency check lives INSIDE the UPDATE, so two          │
//! │         concurrent debits can never drive the counter below zero:      │
//! │         whichever commits second sees the reduced balance and          │
//! │         matches no row (rows_affected = 0 → insufficient stock).       │
//! │                                                                         │
//! │  The CHECK (units_available >= 0) constraint backstops both paths.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use hemovault_core::{BloodGroup, BloodStockEntry, Units};

/// Repository for blood stock ledger operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Gets the ledger row for one blood group.
    ///
    /// The eight rows are created by migration and never deleted, so a
    /// missing row is a deployment fault, not a caller mistake.
    pub async fn get_by_group(&self, blood_group: BloodGroup) -> DbResult<BloodStockEntry> {
        let entry: Option<BloodStockEntry> = sqlx::query_as(
            r#"
            SELECT
                stock_id,
                blood_group,
                units_available,
                minimum_threshold,
                last_updated,
                updated_by
            FROM blood_stock
            WHERE blood_group = ?1
            "#,
        )
        .bind(blood_group)
        .fetch_optional(&self.pool)
        .await?;

        entry.ok_or_else(|| DbError::not_found("Blood stock", blood_group))
    }

    /// Gets all eight ledger rows in display order.
    pub async fn list_all(&self) -> DbResult<Vec<BloodStockEntry>> {
        let entries: Vec<BloodStockEntry> = sqlx::query_as(
            r#"
            SELECT
                stock_id,
                blood_group,
                units_available,
                minimum_threshold,
                last_updated,
                updated_by
            FROM blood_stock
            ORDER BY stock_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Credits units to a blood group inside the caller's transaction.
    ///
    /// Credits always succeed for a known group; there is no upper bound on
    /// the shelf.
    pub async fn credit(
        &self,
        conn: &mut SqliteConnection,
        blood_group: BloodGroup,
        units: Units,
        staff_id: Option<i64>,
    ) -> DbResult<()> {
        debug!(blood_group = %blood_group, units = units.count(), "Crediting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE blood_stock SET
                units_available = units_available + ?1,
                last_updated = ?2,
                updated_by = ?3
            WHERE blood_group = ?4
            "#,
        )
        .bind(units)
        .bind(now)
        .bind(staff_id)
        .bind(blood_group)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Blood stock", blood_group));
        }

        Ok(())
    }

    /// Attempts to debit units from a blood group inside the caller's
    /// transaction.
    ///
    /// ## Returns
    /// * `Ok(true)` - stock was sufficient and has been debited
    /// * `Ok(false)` - stock was insufficient; the ledger is untouched
    ///
    /// The caller decides what insufficiency means (usually: roll back and
    /// report the current balance).
    pub async fn try_debit(
        &self,
        conn: &mut SqliteConnection,
        blood_group: BloodGroup,
        units: Units,
        staff_id: Option<i64>,
    ) -> DbResult<bool> {
        debug!(blood_group = %blood_group, units = units.count(), "Debiting stock");

        let now = Utc::now();

        // Sufficiency is part of the WHERE clause: under concurrency the
        // second debit sees the first one's balance and simply matches
        // nothing instead of going negative.
        let result = sqlx::query(
            r#"
            UPDATE blood_stock SET
                units_available = units_available - ?1,
                last_updated = ?2,
                updated_by = ?3
            WHERE blood_group = ?4 AND units_available >= ?1
            "#,
        )
        .bind(units)
        .bind(now)
        .bind(staff_id)
        .bind(blood_group)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Updates the low-stock threshold for a blood group.
    pub async fn set_threshold(&self, blood_group: BloodGroup, threshold: Units) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE blood_stock SET
                minimum_threshold = ?1,
                last_updated = ?2
            WHERE blood_group = ?3
            "#,
        )
        .bind(threshold)
        .bind(now)
        .bind(blood_group)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Blood stock", blood_group));
        }

        Ok(())
    }

    /// Counts blood groups currently below their minimum threshold.
    ///
    /// Used for the dashboard's active-alert count.
    pub async fn count_below_threshold(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM blood_stock WHERE units_available < minimum_threshold",
        )
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

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_credit_and_debit_move_the_ledger() {
        let db = test_db().await;
        let stock = db.stock();

        let mut tx = db.pool().begin().await.unwrap();
        stock
            .credit(&mut tx, BloodGroup::OPositive, Units::new(5), None)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let entry = stock.get_by_group(BloodGroup::OPositive).await.unwrap();
        assert_eq!(entry.units_available, Units::new(5));

        let mut tx = db.pool().begin().await.unwrap();
        let debited = stock
            .try_debit(&mut tx, BloodGroup::OPositive, Units::new(3), None)
            .await
            .unwrap();
        assert!(debited);
        tx.commit().await.unwrap();

        let entry = stock.get_by_group(BloodGroup::OPositive).await.unwrap();
        assert_eq!(entry.units_available, Units::new(2));
    }

    #[tokio::test]
    async fn test_debit_refuses_insufficient_stock() {
        let db = test_db().await;
        let stock = db.stock();

        let mut tx = db.pool().begin().await.unwrap();
        stock
            .credit(&mut tx, BloodGroup::ABNegative, Units::new(2), None)
            .await
            .unwrap();

        // asks for 3 with only 2 on the shelf
        let debited = stock
            .try_debit(&mut tx, BloodGroup::ABNegative, Units::new(3), None)
            .await
            .unwrap();
        assert!(!debited);
        tx.commit().await.unwrap();

        let entry = stock.get_by_group(BloodGroup::ABNegative).await.unwrap();
        assert_eq!(entry.units_available, Units::new(2));
    }

    #[tokio::test]
    async fn test_debit_to_exactly_zero_succeeds() {
        let db = test_db().await;
        let stock = db.stock();

        let mut tx = db.pool().begin().await.unwrap();
        stock
            .credit(&mut tx, BloodGroup::BNegative, Units::new(4), None)
            .await
            .unwrap();
        let debited = stock
            .try_debit(&mut tx, BloodGroup::BNegative, Units::new(4), None)
            .await
            .unwrap();
        assert!(debited);
        tx.commit().await.unwrap();

        let entry = stock.get_by_group(BloodGroup::BNegative).await.unwrap();
        assert_eq!(entry.units_available, Units::zero());
    }

    #[tokio::test]
    async fn test_threshold_and_alert_count() {
        let db = test_db().await;
        let stock = db.stock();

        // all 8 groups start at 0 units below the default threshold of 10
        assert_eq!(stock.count_below_threshold().await.unwrap(), 8);

        let mut tx = db.pool().begin().await.unwrap();
        stock
            .credit(&mut tx, BloodGroup::APositive, Units::new(50), None)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(stock.count_below_threshold().await.unwrap(), 7);

        stock
            .set_threshold(BloodGroup::APositive, Units::new(60))
            .await
            .unwrap();
        assert_eq!(stock.count_below_threshold().await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_list_all_in_display_order() {
        let db = test_db().await;
        let entries = db.stock().list_all().await.unwrap();

        assert_eq!(entries.len(), 8);
        let groups: Vec<BloodGroup> = entries.iter().map(|e| e.blood_group).collect();
        assert_eq!(groups, BloodGroup::ALL.to_vec());
    }
}

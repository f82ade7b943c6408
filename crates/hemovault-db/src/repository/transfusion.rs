//! # Transfusion Repository
//!
//! The allocation audit trail. One row per allocation, written inside the
//! allocation transaction and never updated afterwards.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use hemovault_core::{NewTransfusion, Transfusion};

/// Repository for transfusion database operations.
#[derive(Debug, Clone)]
pub struct TransfusionRepository {
    pool: SqlitePool,
}

impl TransfusionRepository {
    /// Creates a new TransfusionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransfusionRepository { pool }
    }

    /// Inserts a transfusion record inside the caller's transaction.
    ///
    /// ## Returns
    /// The generated transfusion id.
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        transfusion: &NewTransfusion,
    ) -> DbResult<i64> {
        debug!(
            request_id = transfusion.request_id,
            units = transfusion.units_transfused.count(),
            "Inserting transfusion record"
        );

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO transfusions (
                request_id, hospital_id, blood_group,
                units_transfused, quantity_ml, transfusion_date,
                patient_name, patient_age, staff_id, remarks, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(transfusion.request_id)
        .bind(transfusion.hospital_id)
        .bind(transfusion.blood_group)
        .bind(transfusion.units_transfused)
        .bind(transfusion.quantity_ml)
        .bind(transfusion.transfusion_date)
        .bind(&transfusion.patient_name)
        .bind(transfusion.patient_age)
        .bind(transfusion.staff_id)
        .bind(&transfusion.remarks)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// All transfusions recorded against one request, oldest first.
    pub async fn list_for_request(&self, request_id: i64) -> DbResult<Vec<Transfusion>> {
        let transfusions: Vec<Transfusion> = sqlx::query_as(
            r#"
            SELECT
                transfusion_id, request_id, hospital_id, blood_group,
                units_transfused, quantity_ml, transfusion_date,
                patient_name, patient_age, staff_id, remarks, created_at
            FROM transfusions
            WHERE request_id = ?1
            ORDER BY transfusion_id
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transfusions)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::hospital::tests::sample_hospital;
    use chrono::NaiveDate;
    use hemovault_core::{BloodGroup, NewRequest, Units, UrgencyLevel};

    #[tokio::test]
    async fn test_insert_and_list_for_request() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let hospital = db
            .hospitals()
            .insert(&sample_hospital("tr@example.com", "MH-BB-555"))
            .await
            .unwrap();
        let request = db
            .requests()
            .insert(&NewRequest {
                hospital_id: hospital.hospital_id,
                blood_group: BloodGroup::ONegative,
                units_requested: Units::new(3),
                request_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                required_by_date: NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
                urgency_level: UrgencyLevel::Critical,
                remarks: None,
            })
            .await
            .unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        let id = db
            .transfusions()
            .insert(
                &mut tx,
                &NewTransfusion {
                    request_id: request.request_id,
                    hospital_id: hospital.hospital_id,
                    blood_group: BloodGroup::ONegative,
                    units_transfused: Units::new(2),
                    quantity_ml: 900,
                    transfusion_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                    patient_name: Some("Ravi Kumar".to_string()),
                    patient_age: Some(54),
                    staff_id: None,
                    remarks: None,
                },
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert!(id > 0);

        let rows = db
            .transfusions()
            .list_for_request(request.request_id)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].units_transfused, Units::new(2));
        assert_eq!(rows[0].quantity_ml, 900);
        assert_eq!(rows[0].patient_name.as_deref(), Some("Ravi Kumar"));
    }
}

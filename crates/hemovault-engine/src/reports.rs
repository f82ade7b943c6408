//! # Monthly Donation Reports
//!
//! Per-group aggregates over the completed donations of one calendar
//! month. Only `Completed` donations count; refused attempts never made
//! it into the table in the first place.

use hemovault_core::validation;
use hemovault_core::views::MonthlyDonationRow;

use crate::error::EngineResult;
use crate::BloodBank;

impl BloodBank {
    /// Aggregates one month of completed donations per blood group.
    ///
    /// Each row carries the donation count, the collected volume, its
    /// fractional unit-equivalent (`ml / 450`) and the distinct donor
    /// count. Groups with no donations that month are absent. Rows come
    /// in blood group display order (A+, A-, ..., O-).
    pub async fn monthly_report(
        &self,
        month: u32,
        year: i32,
    ) -> EngineResult<Vec<MonthlyDonationRow>> {
        validation::validate_report_month(month)?;
        validation::validate_report_year(year)?;

        Ok(self.db.donations().monthly_summary(year, month).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use chrono::NaiveDate;
    use hemovault_core::types::{BloodGroup, DonationStatus, NewDonation, NewDonor};
    use hemovault_db::{Database, DbConfig};

    async fn test_bank() -> BloodBank {
        let db = Database::new(DbConfig::in_memory()).await.expect("open db");
        BloodBank::new(db)
    }

    async fn register_donor(bank: &BloodBank, email: &str, blood_group: BloodGroup) -> i64 {
        let donor = bank
            .database()
            .donors()
            .insert(&NewDonor {
                first_name: "Saanvi".into(),
                last_name: "Deshpande".into(),
                email: email.into(),
                phone: "9822045678".into(),
                blood_group,
                date_of_birth: NaiveDate::from_ymd_opt(1994, 6, 12).expect("date"),
                gender: "Female".into(),
                address: None,
                city: Some("Pune".into()),
                state: Some("Maharashtra".into()),
                pincode: None,
                last_donation_date: None,
            })
            .await
            .expect("insert donor");
        donor.donor_id
    }

    async fn record_completed_donation(
        bank: &BloodBank,
        donor_id: i64,
        blood_group: BloodGroup,
        date: NaiveDate,
        quantity_ml: i64,
    ) {
        let mut conn = bank.database().pool().acquire().await.expect("conn");
        bank.database()
            .donations()
            .insert(
                &mut conn,
                &NewDonation {
                    donor_id,
                    donation_date: date,
                    blood_group,
                    quantity_ml,
                    hemoglobin_level: Some(13.2),
                    blood_pressure: Some("118/78".into()),
                    donation_status: DonationStatus::Completed,
                    staff_id: None,
                    remarks: None,
                },
            )
            .await
            .expect("insert donation");
    }

    #[tokio::test]
    async fn test_report_aggregates_one_month() {
        let bank = test_bank().await;
        let donor = register_donor(&bank, "saanvi@example.com", BloodGroup::OPositive).await;

        let march_1 = NaiveDate::from_ymd_opt(2025, 3, 1).expect("date");
        let march_20 = NaiveDate::from_ymd_opt(2025, 3, 20).expect("date");
        let april_2 = NaiveDate::from_ymd_opt(2025, 4, 2).expect("date");

        record_completed_donation(&bank, donor, BloodGroup::OPositive, march_1, 450).await;
        record_completed_donation(&bank, donor, BloodGroup::OPositive, march_20, 350).await;
        record_completed_donation(&bank, donor, BloodGroup::OPositive, april_2, 450).await;

        let report = bank.monthly_report(3, 2025).await.expect("report");

        assert_eq!(report.len(), 1);
        let row = &report[0];
        assert_eq!(row.blood_group, BloodGroup::OPositive);
        assert_eq!(row.total_donations, 2);
        assert_eq!(row.total_quantity_ml, 800);
        assert!((row.total_units - 800.0 / 450.0).abs() < 1e-9);
        assert_eq!(row.unique_donors, 1);
    }

    #[tokio::test]
    async fn test_report_with_no_donations_is_empty() {
        let bank = test_bank().await;

        let report = bank.monthly_report(1, 2024).await.expect("report");
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_report_rejects_out_of_range_month() {
        let bank = test_bank().await;

        let err = bank.monthly_report(13, 2025).await.expect_err("month 13");
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(err.to_string(), "Invalid argument: month must be between 1 and 12");
    }
}

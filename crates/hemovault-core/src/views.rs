//! # Read-Model Views
//!
//! Serializable projection rows for the dashboard and reporting surfaces.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       View Construction                                 │
//! │                                                                         │
//! │  SQLite row / join  ──►  entity or raw row (hemovault-db)              │
//! │                               │                                         │
//! │                               ▼                                         │
//! │            derivation helpers in THIS MODULE                            │
//! │            (stock status, shortage, eligibility label,                  │
//! │             deadline status, fractional units)                          │
//! │                               │                                         │
//! │                               ▼                                         │
//! │            camelCase JSON row for the caller                            │
//! │                                                                         │
//! │  Derived fields are computed at read time from persisted state and      │
//! │  never stored, so a row can not go stale between writes.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::eligibility;
use crate::types::{
    AlertLevel, BloodGroup, BloodStockEntry, DeadlineStatus, DonationStatus, Donor, RequestStatus,
    StockStatus, UrgencyLevel,
};
use crate::units::{fractional_units, Units};
use crate::STANDARD_UNIT_VOLUME_ML;

// =============================================================================
// Stock Views
// =============================================================================

/// One shelf position: a blood group with its live ledger state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockStatusRow {
    pub blood_group: BloodGroup,
    pub units_available: Units,
    /// Volume equivalent of the units on hand (count x 450 ml).
    pub quantity_ml: i64,
    pub minimum_threshold: Units,
    pub stock_status: StockStatus,
    pub last_updated: DateTime<Utc>,
}

impl StockStatusRow {
    /// Projects a ledger entry into its dashboard row.
    pub fn from_entry(entry: &BloodStockEntry) -> Self {
        Self {
            blood_group: entry.blood_group,
            units_available: entry.units_available,
            quantity_ml: entry.units_available.count() * STANDARD_UNIT_VOLUME_ML,
            minimum_threshold: entry.minimum_threshold,
            stock_status: StockStatus::derive(entry.units_available, entry.minimum_threshold),
            last_updated: entry.last_updated,
        }
    }
}

/// A blood group whose stock has fallen below its minimum threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockAlert {
    pub blood_group: BloodGroup,
    pub units_available: Units,
    pub minimum_threshold: Units,
    /// How many units short of the threshold the group is.
    pub shortage: Units,
    pub alert_level: AlertLevel,
}

impl LowStockAlert {
    /// Returns the alert for a ledger entry, or `None` while stock is adequate.
    pub fn from_entry(entry: &BloodStockEntry) -> Option<Self> {
        let status = StockStatus::derive(entry.units_available, entry.minimum_threshold);
        let alert_level = status.alert_level()?;

        Some(Self {
            blood_group: entry.blood_group,
            units_available: entry.units_available,
            minimum_threshold: entry.minimum_threshold,
            shortage: entry.minimum_threshold - entry.units_available,
            alert_level,
        })
    }
}

// =============================================================================
// Donor Views
// =============================================================================

/// Donor roster row with live eligibility.
///
/// The stored `is_eligible` flag is advisory; this row re-derives the flag
/// from `last_donation_date` against today so the roster never shows a donor
/// as blocked after their interval has actually elapsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorSummaryRow {
    pub donor_id: i64,
    pub donor_name: String,
    pub email: String,
    pub phone: String,
    pub blood_group: BloodGroup,
    pub total_donations: i64,
    pub last_donation_date: Option<NaiveDate>,
    pub is_eligible: bool,
    /// `"Eligible"` or `"Not Eligible (N days remaining)"`.
    pub eligibility_status: String,
}

impl DonorSummaryRow {
    pub fn from_donor(donor: &Donor, today: NaiveDate) -> Self {
        Self {
            donor_id: donor.donor_id,
            donor_name: donor.full_name(),
            email: donor.email.clone(),
            phone: donor.phone.clone(),
            blood_group: donor.blood_group,
            total_donations: donor.total_donations,
            last_donation_date: donor.last_donation_date,
            is_eligible: eligibility::is_eligible(donor.last_donation_date, today),
            eligibility_status: eligibility::status_label(donor.last_donation_date, today),
        }
    }
}

// =============================================================================
// Donation Views
// =============================================================================

/// Recent donation feed row, joined with donor and staff names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentDonationRow {
    pub donation_id: i64,
    pub donor_name: String,
    pub blood_group: BloodGroup,
    pub quantity_ml: i64,
    pub donation_date: NaiveDate,
    pub hemoglobin_level: Option<f64>,
    pub donation_status: DonationStatus,
    /// Collecting staff member, if one was recorded.
    pub staff_name: Option<String>,
}

// =============================================================================
// Request Views
// =============================================================================

/// Open hospital request with its remaining need and deadline band.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequestRow {
    pub request_id: i64,
    pub hospital_name: String,
    pub city: String,
    pub blood_group: BloodGroup,
    pub units_requested: Units,
    pub units_fulfilled: Units,
    pub units_pending: Units,
    pub urgency_level: UrgencyLevel,
    pub request_status: RequestStatus,
    pub request_date: NaiveDate,
    pub required_by_date: NaiveDate,
    pub deadline_status: DeadlineStatus,
}

// =============================================================================
// Report Views
// =============================================================================

/// One blood group's line in the monthly donation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyDonationRow {
    pub blood_group: BloodGroup,
    /// Completed donations in the month.
    pub total_donations: i64,
    pub total_quantity_ml: i64,
    /// Collected volume in standard units (ml / 450), fractional.
    pub total_units: f64,
    /// Distinct donors who contributed.
    pub unique_donors: i64,
}

impl MonthlyDonationRow {
    pub fn new(
        blood_group: BloodGroup,
        total_donations: i64,
        total_quantity_ml: i64,
        unique_donors: i64,
    ) -> Self {
        Self {
            blood_group,
            total_donations,
            total_quantity_ml,
            total_units: fractional_units(total_quantity_ml),
            unique_donors,
        }
    }
}

// =============================================================================
// Dashboard Views
// =============================================================================

/// Headline counts for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewStats {
    pub total_donors: i64,
    pub active_hospitals: i64,
    pub completed_donations: i64,
    /// Requests not yet fully fulfilled.
    pub open_requests: i64,
    /// Blood groups currently below their minimum threshold.
    pub active_alerts: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(group: BloodGroup, units: i64, threshold: i64) -> BloodStockEntry {
        BloodStockEntry {
            stock_id: 1,
            blood_group: group,
            units_available: Units::new(units),
            minimum_threshold: Units::new(threshold),
            last_updated: Utc::now(),
            updated_by: None,
        }
    }

    #[test]
    fn test_stock_row_derives_volume_and_status() {
        let row = StockStatusRow::from_entry(&entry(BloodGroup::OPositive, 10, 20));
        assert_eq!(row.quantity_ml, 4500);
        assert_eq!(row.stock_status, StockStatus::Low);

        let row = StockStatusRow::from_entry(&entry(BloodGroup::ABPositive, 25, 10));
        assert_eq!(row.quantity_ml, 11250);
        assert_eq!(row.stock_status, StockStatus::Adequate);
    }

    #[test]
    fn test_low_stock_alert_levels_and_shortage() {
        let alert = LowStockAlert::from_entry(&entry(BloodGroup::OPositive, 10, 20))
            .expect("low stock should alert");
        assert_eq!(alert.alert_level, AlertLevel::Warning);
        assert_eq!(alert.shortage, Units::new(10));

        let alert = LowStockAlert::from_entry(&entry(BloodGroup::ABNegative, 4, 10))
            .expect("critical stock should alert");
        assert_eq!(alert.alert_level, AlertLevel::Urgent);
        assert_eq!(alert.shortage, Units::new(6));

        let alert = LowStockAlert::from_entry(&entry(BloodGroup::ONegative, 0, 10))
            .expect("empty shelf should alert");
        assert_eq!(alert.alert_level, AlertLevel::Critical);
        assert_eq!(alert.shortage, Units::new(10));

        assert!(LowStockAlert::from_entry(&entry(BloodGroup::APositive, 15, 10)).is_none());
    }

    #[test]
    fn test_donor_summary_live_eligibility() {
        let mut donor = Donor {
            donor_id: 7,
            first_name: "Meera".to_string(),
            last_name: "Nair".to_string(),
            email: "meera@example.com".to_string(),
            phone: "9876500000".to_string(),
            blood_group: BloodGroup::BPositive,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 3, 12).unwrap(),
            gender: "Female".to_string(),
            address: None,
            city: None,
            state: None,
            pincode: None,
            last_donation_date: Some(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()),
            total_donations: 4,
            // stale stored flag, the row must re-derive
            is_eligible: false,
            registered_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            created_at: Utc::now(),
        };

        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let row = DonorSummaryRow::from_donor(&donor, today);
        assert!(row.is_eligible);
        assert_eq!(row.eligibility_status, "Eligible");
        assert_eq!(row.donor_name, "Meera Nair");

        donor.last_donation_date = Some(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        let row = DonorSummaryRow::from_donor(&donor, today);
        assert!(!row.is_eligible);
        assert_eq!(row.eligibility_status, "Not Eligible (76 days remaining)");
    }

    #[test]
    fn test_monthly_row_fractional_units() {
        let row = MonthlyDonationRow::new(BloodGroup::OPositive, 3, 1350, 3);
        assert_eq!(row.total_units, 3.0);

        let row = MonthlyDonationRow::new(BloodGroup::ANegative, 2, 850, 2);
        assert!((row.total_units - 1.888_888).abs() < 0.001);
    }

    #[test]
    fn test_rows_serialize_as_camel_case() {
        let row = StockStatusRow::from_entry(&entry(BloodGroup::OPositive, 10, 20));
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["bloodGroup"], "O+");
        assert_eq!(json["unitsAvailable"], 10);
        assert_eq!(json["quantityMl"], 4500);
        assert_eq!(json["stockStatus"], "LOW");

        let alert = LowStockAlert::from_entry(&entry(BloodGroup::OPositive, 10, 20)).unwrap();
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["alertLevel"], "WARNING");
        assert_eq!(json["shortage"], 10);
    }
}

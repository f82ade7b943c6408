//! # Domain Types
//!
//! Core domain types used throughout HemoVault.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Donor       │   │    Donation     │   │  BloodRequest   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  donor_id       │   │  donation_id    │   │  request_id     │       │
//! │  │  blood_group    │   │  donor_id (FK)  │   │  hospital_id    │       │
//! │  │  last_donation  │   │  quantity_ml    │   │  units_requested│       │
//! │  │  total_donations│   │  status         │   │  units_fulfilled│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   BloodGroup    │   │  RequestStatus  │   │   StockStatus   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │   (derived)     │       │
//! │  │  A+ A- B+ B-    │   │  Pending        │   │  OUT_OF_STOCK   │       │
//! │  │  AB+ AB- O+ O-  │   │  Approved       │   │  CRITICAL       │       │
//! │  └─────────────────┘   │  Part. Fulfilled│   │  LOW            │       │
//! │                        │  Fulfilled      │   │  ADEQUATE       │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stored vs Derived
//! Stored enums (`BloodGroup`, `DonationStatus`, `RequestStatus`,
//! `UrgencyLevel`, `StaffRole`) round-trip through the database as TEXT with
//! their exact wire labels. Derived enums (`StockStatus`, `AlertLevel`,
//! `DeadlineStatus`) are *never* persisted - they are recomputed from numeric
//! fields on every read, so they cannot diverge from the data they summarize.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::units::Units;

// =============================================================================
// Blood Group
// =============================================================================

/// One of the eight ABO/Rh blood groups.
///
/// The sole partition key for stock: the ledger keeps exactly one counter per
/// variant. Wire and storage label is the clinical notation ("A+", "AB-", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "A+"))]
    APositive,
    #[serde(rename = "A-")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "A-"))]
    ANegative,
    #[serde(rename = "B+")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "B+"))]
    BPositive,
    #[serde(rename = "B-")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "B-"))]
    BNegative,
    #[serde(rename = "AB+")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "AB+"))]
    ABPositive,
    #[serde(rename = "AB-")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "AB-"))]
    ABNegative,
    #[serde(rename = "O+")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "O+"))]
    OPositive,
    #[serde(rename = "O-")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "O-"))]
    ONegative,
}

impl BloodGroup {
    /// All eight groups in display order (the order stock rows are seeded).
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
        BloodGroup::ABPositive,
        BloodGroup::ABNegative,
        BloodGroup::OPositive,
        BloodGroup::ONegative,
    ];

    /// The clinical notation for this group.
    pub const fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::ABPositive => "AB+",
            BloodGroup::ABNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A+" => Ok(BloodGroup::APositive),
            "A-" => Ok(BloodGroup::ANegative),
            "B+" => Ok(BloodGroup::BPositive),
            "B-" => Ok(BloodGroup::BNegative),
            "AB+" => Ok(BloodGroup::ABPositive),
            "AB-" => Ok(BloodGroup::ABNegative),
            "O+" => Ok(BloodGroup::OPositive),
            "O-" => Ok(BloodGroup::ONegative),
            _ => Err(ValidationError::InvalidFormat {
                field: "blood_group".to_string(),
                reason: "must be one of A+, A-, B+, B-, AB+, AB-, O+, O-".to_string(),
            }),
        }
    }
}

// =============================================================================
// Donation Status
// =============================================================================

/// The status of a donation record.
///
/// Engine-processed donations are created directly as `Completed` (all gates
/// passed, ledger credited in the same transaction). `Pending` and `Rejected`
/// exist for records entered through other channels; the only legal
/// transitions are Pending → Completed and Pending → Rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum DonationStatus {
    /// Recorded but not yet screened/banked.
    Pending,
    /// Banked; has credited the stock ledger exactly once.
    Completed,
    /// Refused after screening; never credits stock.
    Rejected,
}

impl Default for DonationStatus {
    fn default() -> Self {
        DonationStatus::Pending
    }
}

// =============================================================================
// Request Status
// =============================================================================

/// The lifecycle status of a hospital blood request.
///
/// Derived from the fulfillment counters, never hand-set (see [`Self::derived`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum RequestStatus {
    /// Submitted, nothing allocated yet.
    Pending,
    /// Reviewed and approved, nothing allocated yet.
    Approved,
    /// Some but not all requested units allocated.
    #[serde(rename = "Partially Fulfilled")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Partially Fulfilled"))]
    PartiallyFulfilled,
    /// Every requested unit allocated. Terminal.
    Fulfilled,
}

impl RequestStatus {
    /// Recomputes the status from the fulfillment counters.
    ///
    /// With nothing fulfilled a request keeps its submission-side state
    /// (`Pending` until explicitly approved); any partial allocation forces
    /// `Partially Fulfilled`; reaching the requested amount is terminal.
    pub fn derived(fulfilled: Units, requested: Units, current: RequestStatus) -> RequestStatus {
        if fulfilled >= requested {
            RequestStatus::Fulfilled
        } else if fulfilled.is_positive() {
            RequestStatus::PartiallyFulfilled
        } else if current == RequestStatus::Approved {
            RequestStatus::Approved
        } else {
            RequestStatus::Pending
        }
    }

    /// Whether more units can still be allocated against this request.
    pub fn is_open(&self) -> bool {
        !matches!(self, RequestStatus::Fulfilled)
    }
}

impl Default for RequestStatus {
    fn default() -> Self {
        RequestStatus::Pending
    }
}

// =============================================================================
// Urgency Level
// =============================================================================

/// How urgently a hospital needs its requested units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum UrgencyLevel {
    Normal,
    Urgent,
    Critical,
}

impl UrgencyLevel {
    /// Sort rank for work queues: Critical first, Normal last.
    pub const fn rank(&self) -> u8 {
        match self {
            UrgencyLevel::Critical => 0,
            UrgencyLevel::Urgent => 1,
            UrgencyLevel::Normal => 2,
        }
    }
}

impl Default for UrgencyLevel {
    fn default() -> Self {
        UrgencyLevel::Normal
    }
}

// =============================================================================
// Staff Role
// =============================================================================

/// Role of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum StaffRole {
    Admin,
    Technician,
    Nurse,
    Doctor,
}

// =============================================================================
// Derived: Stock Status
// =============================================================================

/// Health of one blood group's stock, derived from the counter and threshold.
///
/// Never persisted - recomputed on every read so it cannot go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    OutOfStock,
    Critical,
    Low,
    Adequate,
}

impl StockStatus {
    /// Derives the status from current units and the configured threshold.
    ///
    /// - `OUT_OF_STOCK` - nothing on the shelf
    /// - `CRITICAL`     - below half the minimum threshold
    /// - `LOW`          - below the minimum threshold
    /// - `ADEQUATE`     - at or above the threshold
    pub fn derive(units_available: Units, minimum_threshold: Units) -> StockStatus {
        if units_available.is_zero() {
            StockStatus::OutOfStock
        } else if units_available.count() * 2 < minimum_threshold.count() {
            // integer form of units < 0.5 × threshold, exact for odd thresholds
            StockStatus::Critical
        } else if units_available < minimum_threshold {
            StockStatus::Low
        } else {
            StockStatus::Adequate
        }
    }

    /// The alert level this status raises, if any.
    pub const fn alert_level(&self) -> Option<AlertLevel> {
        match self {
            StockStatus::OutOfStock => Some(AlertLevel::Critical),
            StockStatus::Critical => Some(AlertLevel::Urgent),
            StockStatus::Low => Some(AlertLevel::Warning),
            StockStatus::Adequate => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "OUT_OF_STOCK",
            StockStatus::Critical => "CRITICAL",
            StockStatus::Low => "LOW",
            StockStatus::Adequate => "ADEQUATE",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Derived: Alert Level
// =============================================================================

/// Severity of a low-stock alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Critical,
    Urgent,
    Warning,
}

impl AlertLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Critical => "CRITICAL",
            AlertLevel::Urgent => "URGENT",
            AlertLevel::Warning => "WARNING",
        }
    }

    /// Sort rank for alert lists: Critical first, Warning last.
    pub const fn rank(&self) -> u8 {
        match self {
            AlertLevel::Critical => 0,
            AlertLevel::Urgent => 1,
            AlertLevel::Warning => 2,
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Derived: Deadline Status
// =============================================================================

/// How a request's required-by date relates to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeadlineStatus {
    #[serde(rename = "OVERDUE")]
    Overdue,
    #[serde(rename = "DUE TODAY")]
    DueToday,
    #[serde(rename = "DUE SOON")]
    DueSoon,
    #[serde(rename = "ON TRACK")]
    OnTrack,
}

impl DeadlineStatus {
    /// Derives the deadline band for a required-by date as of `today`.
    ///
    /// `DUE SOON` covers one to three days out.
    pub fn derive(required_by: NaiveDate, today: NaiveDate) -> DeadlineStatus {
        let days_left = required_by.signed_duration_since(today).num_days();
        if days_left < 0 {
            DeadlineStatus::Overdue
        } else if days_left == 0 {
            DeadlineStatus::DueToday
        } else if days_left <= 3 {
            DeadlineStatus::DueSoon
        } else {
            DeadlineStatus::OnTrack
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            DeadlineStatus::Overdue => "OVERDUE",
            DeadlineStatus::DueToday => "DUE TODAY",
            DeadlineStatus::DueSoon => "DUE SOON",
            DeadlineStatus::OnTrack => "ON TRACK",
        }
    }
}

impl fmt::Display for DeadlineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Donor
// =============================================================================

/// A registered blood donor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Donor {
    pub donor_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub blood_group: BloodGroup,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    /// Date of the most recent completed donation, if any.
    pub last_donation_date: Option<NaiveDate>,
    /// Count of this donor's completed donations.
    pub total_donations: i64,
    /// Advisory snapshot updated on every completed donation. Read models
    /// derive eligibility live from `last_donation_date` instead.
    pub is_eligible: bool,
    pub registered_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Donor {
    /// Display name as shown on dashboards and receipts.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields required to register a donor.
#[derive(Debug, Clone)]
pub struct NewDonor {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub blood_group: BloodGroup,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    /// Carried over for donors migrating in with donation history.
    pub last_donation_date: Option<NaiveDate>,
}

// =============================================================================
// Staff
// =============================================================================

/// A staff member who can process donations and allocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Staff {
    pub staff_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: StaffRole,
    pub hire_date: NaiveDate,
    /// Only active staff may be referenced by new donations/allocations.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Staff {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields required to register a staff member.
#[derive(Debug, Clone)]
pub struct NewStaff {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: StaffRole,
    pub hire_date: NaiveDate,
}

// =============================================================================
// Hospital
// =============================================================================

/// A hospital that submits blood requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Hospital {
    pub hospital_id: i64,
    pub hospital_name: String,
    pub hospital_type: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: Option<String>,
    pub license_number: String,
    /// A hospital with unfulfilled requests cannot be deactivated.
    pub is_active: bool,
    pub registered_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Fields required to register a hospital.
#[derive(Debug, Clone)]
pub struct NewHospital {
    pub hospital_name: String,
    pub hospital_type: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: Option<String>,
    pub license_number: String,
}

// =============================================================================
// Blood Stock Entry
// =============================================================================

/// One blood group's row in the stock ledger.
///
/// `units_available` is the canonical counter; the volume shown in views is
/// always derived as units × 450. Exactly one entry exists per blood group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BloodStockEntry {
    pub stock_id: i64,
    pub blood_group: BloodGroup,
    /// Invariant: never negative. Enforced by guarded updates and a CHECK.
    pub units_available: Units,
    pub minimum_threshold: Units,
    pub last_updated: DateTime<Utc>,
    pub updated_by: Option<i64>,
}

impl BloodStockEntry {
    /// Current derived stock status.
    pub fn status(&self) -> StockStatus {
        StockStatus::derive(self.units_available, self.minimum_threshold)
    }
}

// =============================================================================
// Donation
// =============================================================================

/// A recorded donation. Immutable once created (audit trail).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Donation {
    pub donation_id: i64,
    pub donor_id: i64,
    pub donation_date: NaiveDate,
    /// Always equals the donor's registered group.
    pub blood_group: BloodGroup,
    pub quantity_ml: i64,
    pub hemoglobin_level: Option<f64>,
    pub blood_pressure: Option<String>,
    pub donation_status: DonationStatus,
    pub staff_id: Option<i64>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a donation record.
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub donor_id: i64,
    pub donation_date: NaiveDate,
    pub blood_group: BloodGroup,
    pub quantity_ml: i64,
    pub hemoglobin_level: Option<f64>,
    pub blood_pressure: Option<String>,
    pub donation_status: DonationStatus,
    pub staff_id: Option<i64>,
    pub remarks: Option<String>,
}

// =============================================================================
// Blood Request
// =============================================================================

/// A hospital's request for units of one blood group.
///
/// The only mutable aggregate besides the stock ledger: `units_fulfilled`
/// grows monotonically toward `units_requested` as allocations land.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BloodRequest {
    pub request_id: i64,
    pub hospital_id: i64,
    pub blood_group: BloodGroup,
    pub units_requested: Units,
    /// Invariant: 0 ≤ fulfilled ≤ requested.
    pub units_fulfilled: Units,
    pub request_date: NaiveDate,
    pub required_by_date: NaiveDate,
    pub urgency_level: UrgencyLevel,
    pub request_status: RequestStatus,
    pub approved_by: Option<i64>,
    pub approval_date: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BloodRequest {
    /// Units still to be allocated.
    pub fn units_pending(&self) -> Units {
        self.units_requested - self.units_fulfilled
    }
}

/// Fields for inserting a request row.
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub hospital_id: i64,
    pub blood_group: BloodGroup,
    pub units_requested: Units,
    pub request_date: NaiveDate,
    pub required_by_date: NaiveDate,
    pub urgency_level: UrgencyLevel,
    pub remarks: Option<String>,
}

// =============================================================================
// Transfusion
// =============================================================================

/// An allocation of units from stock to a request. Immutable (audit trail).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transfusion {
    pub transfusion_id: i64,
    pub request_id: i64,
    pub hospital_id: i64,
    pub blood_group: BloodGroup,
    pub units_transfused: Units,
    /// Nominal volume: units × 450.
    pub quantity_ml: i64,
    pub transfusion_date: NaiveDate,
    pub patient_name: Option<String>,
    pub patient_age: Option<i64>,
    pub staff_id: Option<i64>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a transfusion record.
#[derive(Debug, Clone)]
pub struct NewTransfusion {
    pub request_id: i64,
    pub hospital_id: i64,
    pub blood_group: BloodGroup,
    pub units_transfused: Units,
    pub quantity_ml: i64,
    pub transfusion_date: NaiveDate,
    pub patient_name: Option<String>,
    pub patient_age: Option<i64>,
    pub staff_id: Option<i64>,
    pub remarks: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

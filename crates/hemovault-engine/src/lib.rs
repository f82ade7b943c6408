//! # hemovault-engine: Inventory Engine for HemoVault
//!
//! This crate is the orchestration layer of the HemoVault blood bank system.
//! Callers hand it operation requests; it applies the business rules from
//! `hemovault-core`, runs the multi-table writes through `hemovault-db`
//! transactions, and reports what happened as serializable outcomes.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BloodBank (Main Entry Point)                     │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Write Operations                            │  │
//! │  │                                                                  │  │
//! │  │  process_donation       validate donor/vitals, insert donation,  │  │
//! │  │                         credit stock, update donor (one tx)      │  │
//! │  │  allocate_blood         debit stock, record transfusion, update  │  │
//! │  │                         request fulfillment (one tx)             │  │
//! │  │  create_request         register a hospital blood request        │  │
//! │  │  approve_request        move a pending request to Approved       │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Read Operations                             │  │
//! │  │                                                                  │  │
//! │  │  stock_status           per-group ledger with derived status     │  │
//! │  │  low_stock_alerts       groups below threshold, by severity      │  │
//! │  │  monthly_report         per-group donation aggregates            │  │
//! │  │  donor_summaries        roster with live eligibility             │  │
//! │  │  recent_donations       newest-first donation feed               │  │
//! │  │  pending_requests       open queue, urgency then deadline        │  │
//! │  │  overview_stats         dashboard counters                       │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  FAILURE MODEL:                                                        │
//! │  • Business failures (ineligible donor, insufficient stock, bad        │
//! │    input) come back as `{ success: false, message }` outcomes          │
//! │  • Write conflicts are retried with backoff, then reported as a        │
//! │    conflict outcome                                                    │
//! │  • Storage faults surface as `EngineError::Storage`                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`donation`] - Donation intake (eligibility, vitals, stock credit)
//! - [`allocation`] - Allocation of stock to hospital requests
//! - [`requests`] - Request creation, approval, hospital deactivation
//! - [`alerts`] - Low stock alert evaluation
//! - [`reports`] - Monthly donation reports
//! - [`views`] - Read models for dashboards
//! - [`error`] - Engine error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hemovault_engine::{BloodBank, DonationRequest};
//! use hemovault_db::DbConfig;
//!
//! let bank = BloodBank::connect(DbConfig::new("hemovault.db")).await?;
//!
//! let outcome = bank
//!     .process_donation(DonationRequest {
//!         donor_id: 1,
//!         blood_group: "O+".parse()?,
//!         quantity_ml: 450,
//!         hemoglobin_level: 13.5,
//!         blood_pressure: "120/80".into(),
//!         staff_id: 1,
//!     })
//!     .await?;
//!
//! assert!(outcome.success);
//! ```

use chrono::{NaiveDate, Utc};
use std::time::Duration;

use hemovault_db::{Database, DbConfig};

// =============================================================================
// Module Declarations
// =============================================================================

pub mod alerts;
pub mod allocation;
pub mod donation;
pub mod error;
pub mod reports;
pub mod requests;
pub mod views;

// =============================================================================
// Re-exports
// =============================================================================

pub use allocation::{AllocationOutcome, AllocationRequest};
pub use donation::{DonationOutcome, DonationRequest};
pub use error::{EngineError, EngineResult};
pub use requests::{NewBloodRequest, OperationOutcome, RequestOutcome};

// =============================================================================
// Constants
// =============================================================================

/// How many times a write path is attempted before the conflict is
/// reported back to the caller.
pub(crate) const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Base delay between write attempts (multiplied by the attempt number).
pub(crate) const RETRY_BASE_DELAY: Duration = Duration::from_millis(25);

// =============================================================================
// BloodBank
// =============================================================================

/// Main entry point for blood bank operations.
///
/// Cheap to clone; every clone shares the same connection pool.
#[derive(Debug, Clone)]
pub struct BloodBank {
    /// Database handle (pool + repositories).
    db: Database,
}

impl BloodBank {
    /// Creates an engine over an already-opened database.
    pub fn new(db: Database) -> Self {
        BloodBank { db }
    }

    /// Opens the database described by `config` and wraps it in an engine.
    pub async fn connect(config: DbConfig) -> EngineResult<Self> {
        let db = Database::new(config).await?;
        Ok(BloodBank::new(db))
    }

    /// Access to the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

// =============================================================================
// Internal Helpers
// =============================================================================

/// Today's date in UTC. All eligibility windows and deadlines are
/// evaluated against this.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Sleeps before the next write attempt. Linear backoff is enough at
/// SQLite contention levels.
pub(crate) async fn backoff(attempt: u32) {
    tokio::time::sleep(RETRY_BASE_DELAY * attempt).await;
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Low Stock Alerts
//!
//! Evaluates the stock ledger against per-group minimum thresholds and
//! reports the groups that need replenishment, most severe first:
//!
//! ```text
//! units_available        derived status      alert level
//! ─────────────────      ───────────────     ────────────
//! 0                      OUT_OF_STOCK        CRITICAL
//! < threshold / 2        CRITICAL            URGENT
//! < threshold            LOW                 WARNING
//! >= threshold           ADEQUATE            (no alert)
//! ```
//!
//! The shortage on each alert is `minimum_threshold - units_available`,
//! the number of units needed to get the group back to adequate.

use tracing::info;

use hemovault_core::types::BloodGroup;
use hemovault_core::units::Units;
use hemovault_core::validation;
use hemovault_core::views::LowStockAlert;

use crate::error::EngineResult;
use crate::requests::OperationOutcome;
use crate::BloodBank;

impl BloodBank {
    /// Returns an alert for every blood group currently below its minimum
    /// threshold, most severe first. Groups at or above threshold are
    /// absent from the list.
    pub async fn low_stock_alerts(&self) -> EngineResult<Vec<LowStockAlert>> {
        let entries = self.db.stock().list_all().await?;

        let mut alerts: Vec<LowStockAlert> =
            entries.iter().filter_map(LowStockAlert::from_entry).collect();
        // Stable sort keeps blood group display order within a level.
        alerts.sort_by_key(|alert| alert.alert_level.rank());

        Ok(alerts)
    }

    /// Sets the minimum threshold for one blood group.
    ///
    /// Takes effect on the next alert evaluation; no stock moves.
    pub async fn set_stock_threshold(
        &self,
        blood_group: BloodGroup,
        threshold: i64,
    ) -> EngineResult<OperationOutcome> {
        if let Err(err) = validation::validate_minimum_threshold(threshold) {
            return Ok(OperationOutcome::refused(err.to_string()));
        }

        self.db
            .stock()
            .set_threshold(blood_group, Units::new(threshold))
            .await?;

        info!(blood_group = %blood_group, threshold, "Stock threshold updated");
        Ok(OperationOutcome::done("Threshold updated successfully."))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

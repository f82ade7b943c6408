//! # Read Models
//!
//! Dashboard-facing views over the ledger and the operational tables.
//! Everything here is read-only; derived fields (stock status, live
//! eligibility, deadline status, pending counts) are computed at read
//! time so the views never go stale.

use hemovault_core::error::ValidationError;
use hemovault_core::views::{
    DonorSummaryRow, OverviewStats, PendingRequestRow, RecentDonationRow, StockStatusRow,
};
use hemovault_core::DEFAULT_RECENT_DONATIONS;

use crate::error::EngineResult;
use crate::{today, BloodBank};

impl BloodBank {
    /// Current ledger state for all eight blood groups, in display order.
    pub async fn stock_status(&self) -> EngineResult<Vec<StockStatusRow>> {
        let entries = self.db.stock().list_all().await?;
        Ok(entries.iter().map(StockStatusRow::from_entry).collect())
    }

    /// Donor roster with donation history and live eligibility.
    pub async fn donor_summaries(&self) -> EngineResult<Vec<DonorSummaryRow>> {
        Ok(self.db.donors().summaries(today()).await?)
    }

    /// Most recent donations, newest first. `limit` defaults to 50.
    pub async fn recent_donations(
        &self,
        limit: Option<i64>,
    ) -> EngineResult<Vec<RecentDonationRow>> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_DONATIONS);
        if limit <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "limit".to_string(),
            }
            .into());
        }

        Ok(self.db.donations().recent_with_names(limit).await?)
    }

    /// Open requests (anything not yet fulfilled), most urgent first and
    /// nearest deadline within the same urgency.
    pub async fn pending_requests(&self) -> EngineResult<Vec<PendingRequestRow>> {
        Ok(self.db.requests().pending_with_hospital(today()).await?)
    }

    /// Dashboard counters, gathered concurrently.
    pub async fn overview_stats(&self) -> EngineResult<OverviewStats> {
        let donors = self.db.donors();
        let hospitals = self.db.hospitals();
        let donations = self.db.donations();
        let requests = self.db.requests();
        let stock = self.db.stock();

        let (total_donors, active_hospitals, completed_donations, open_requests, active_alerts) =
            tokio::try_join!(
                donors.count(),
                hospitals.count_active(),
                donations.count_completed(),
                requests.count_open(),
                stock.count_below_threshold(),
            )?;

        Ok(OverviewStats {
            total_donors,
            active_hospitals,
            completed_donations,
            open_requests,
            active_alerts,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Engine Error Types
//!
//! Errors that escape an engine operation.
//!
//! Expected business failures (ineligible donor, insufficient stock,
//! rejected input) never appear here: write operations fold them into
//! their `{ success: false, message }` outcome so one refused donation
//! does not read like a system fault. What remains is:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Engine Error Categories                            │
//! │                                                                         │
//! │  ┌──────────────────────────┐  ┌──────────────────────────────────┐    │
//! │  │        Storage           │  │          Validation              │    │
//! │  │                          │  │                                  │    │
//! │  │  Pool/connection faults  │  │  Malformed read-model arguments  │    │
//! │  │  Failed queries          │  │  (month 13, year out of range)   │    │
//! │  │  Migration errors        │  │                                  │    │
//! │  └──────────────────────────┘  └──────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use hemovault_core::error::ValidationError;
use hemovault_db::DbError;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Error type for faults that abort an engine operation outright.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The database layer failed. The operation's transaction (if any)
    /// was rolled back; nothing was partially applied.
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    /// A read-model argument failed validation before any query ran.
    #[error("Invalid argument: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Unit Tests
// =============================================================================

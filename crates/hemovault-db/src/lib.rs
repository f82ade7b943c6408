//! # hemovault-db: Database Layer for HemoVault
//!
//! This crate provides database access for the HemoVault blood bank system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      HemoVault Data Flow                                │
//! │                                                                         │
//! │  Engine operation (process_donation, allocate_blood)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  hemovault-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (stock.rs,   │    │  (embedded)  │  │   │
//! │  │   │               │    │   donor.rs..) │    │              │  │   │
//! │  │   │ SqlitePool    │    │ StockRepo     │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │◄───│ DonationRepo  │    │ 002_seed.sql │  │   │
//! │  │   │ Management    │    │ RequestRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │        WAL mode, foreign keys on, busy timeout 5s              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (donor, stock, request, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hemovault_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/hemovault.db");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let stock = db.stock().list_all().await?;
//! ```
//!
//! ## Transactions
//!
//! Write paths that touch several tables at once (record a donation and
//! credit stock, allocate and debit stock) run inside a single sqlx
//! transaction. Repository methods that participate take a
//! `&mut SqliteConnection` so the engine controls the transaction boundary;
//! pool-based methods on the same repositories serve the single-statement
//! cases.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::donation::DonationRepository;
pub use repository::donor::DonorRepository;
pub use repository::hospital::HospitalRepository;
pub use repository::request::RequestRepository;
pub use repository::staff::StaffRepository;
pub use repository::stock::StockRepository;
pub use repository::transfusion::TransfusionRepository;

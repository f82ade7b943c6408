//! # Repository Module
//!
//! Database repository implementations for HemoVault.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Engine operation                                                      │
//! │       │                                                                 │
//! │       │  db.stock().try_debit(&mut tx, group, units, staff)            │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  StockRepository                                                       │
//! │  ├── get_by_group(&self, group)                                        │
//! │  ├── credit(&self, conn, group, units, staff)                          │
//! │  ├── try_debit(&self, conn, group, units, staff)                       │
//! │  └── list_all(&self)                                                   │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Methods that take a `&mut SqliteConnection` participate in a          │
//! │  transaction the caller owns; the rest run on the shared pool.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`donor::DonorRepository`] - Donor registry and donation counters
//! - [`staff::StaffRepository`] - Staff registry
//! - [`hospital::HospitalRepository`] - Hospital registry
//! - [`stock::StockRepository`] - The blood stock ledger
//! - [`donation::DonationRepository`] - Donation records and reports
//! - [`request::RequestRepository`] - Hospital requests and fulfillment
//! - [`transfusion::TransfusionRepository`] - Allocation audit trail

pub mod donation;
pub mod donor;
pub mod hospital;
pub mod request;
pub mod staff;
pub mod stock;
pub mod transfusion;

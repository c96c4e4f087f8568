//! `bursar-recon`: cash session reconciliation and financial anomaly detection.
//!
//! Pure engine crate: receives a frozen snapshot of school ledger records,
//! returns derived reports. No CLI or IO dependencies.

pub mod amount;
pub mod chain;
pub mod classify;
pub mod config;
pub mod delinquency;
pub mod demand;
pub mod engine;
pub mod error;
pub mod filter;
pub mod model;
pub mod monthly;
pub mod normalize;
pub mod performance;
pub mod reconcile;
pub mod report;
pub mod snapshot;
pub mod summary;

pub use config::ReconConfig;
pub use engine::{derive, derive_json, derive_ledger, DeriveRequest};
pub use error::ReconError;
pub use filter::{DateRange, ReportFilters};
pub use model::{DemandStatus, Ledger};
pub use report::{Reports, Severity};
pub use snapshot::Snapshot;

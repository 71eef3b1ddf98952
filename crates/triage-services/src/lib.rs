//! Triage Services Library
//!
//! Orchestrates one request from intake to verdict: validation, staging,
//! archive expansion, ordered dispatch and result aggregation.

pub mod aggregator;
pub mod intake;

pub use aggregator::ResultAggregator;
pub use intake::{IntakeRequest, ScanInput, ScanService};

//! Request intake and the end-to-end scan pipeline.

pub mod service;
pub mod types;

pub use service::ScanService;
pub use types::{IntakeRequest, ScanInput};

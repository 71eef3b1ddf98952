//! Triage Infrastructure Library
//!
//! Shared infrastructure for the triage binaries:
//! - Telemetry initialization
//! - Error response shape

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod error;

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry, LogFormat};

pub use error::ErrorResponse;

//! Telemetry initialization
//!
//! Structured tracing to stderr. Stdout is left to command output.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry, LogFormat};

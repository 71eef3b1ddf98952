//! Error types module
//!
//! Every failure the pipeline can report is a variant of [`ScanError`]. Each
//! variant maps to a stable, machine-readable [`ErrorKind`] so callers can tell
//! `SizeExceeded` from `AnalyzerError` without parsing message text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like rejected input
    Debug,
    /// Warning level - for hostile input and recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Stable machine-readable error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ReadError,
    UnsupportedType,
    CorruptArchive,
    PathTraversal,
    SizeExceeded,
    AnalyzerError,
    Timeout,
    Unauthorized,
    InvalidRequest,
    NotFound,
    Cancelled,
    ConfigError,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ReadError => "read_error",
            ErrorKind::UnsupportedType => "unsupported_type",
            ErrorKind::CorruptArchive => "corrupt_archive",
            ErrorKind::PathTraversal => "path_traversal",
            ErrorKind::SizeExceeded => "size_exceeded",
            ErrorKind::AnalyzerError => "analyzer_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::ConfigError => "config_error",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata describing how an error should be presented to a caller.
pub trait ErrorMetadata {
    /// Machine-readable error kind
    fn error_kind(&self) -> ErrorKind;

    /// Whether retrying the same request may succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Read error: {0}")]
    ReadError(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("Path traversal attempt in archive member: {0}")]
    PathTraversal(String),

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    SizeExceeded { size: u64, max: u64 },

    #[error("Analyzer error: {0}")]
    Analyzer(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for ScanError {
    fn from(err: anyhow::Error) -> Self {
        ScanError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for ScanError {
    fn from(err: io::Error) -> Self {
        ScanError::Internal(format!("IO error: {}", err))
    }
}

/// Static metadata for each variant: (kind, recoverable, suggested_action, log_level).
fn scan_error_static_metadata(
    err: &ScanError,
) -> (ErrorKind, bool, Option<&'static str>, LogLevel) {
    match err {
        ScanError::ReadError(_) => (
            ErrorKind::ReadError,
            true,
            Some("Check that the file is readable and retry"),
            LogLevel::Warn,
        ),
        ScanError::UnsupportedType(_) => (
            ErrorKind::UnsupportedType,
            false,
            Some("Submit a supported image, video, document or archive"),
            LogLevel::Debug,
        ),
        ScanError::CorruptArchive(_) => (
            ErrorKind::CorruptArchive,
            false,
            Some("Re-create the archive and submit it again"),
            LogLevel::Warn,
        ),
        ScanError::PathTraversal(_) => (
            ErrorKind::PathTraversal,
            false,
            None,
            LogLevel::Warn,
        ),
        ScanError::SizeExceeded { .. } => (
            ErrorKind::SizeExceeded,
            false,
            Some("Reduce file size or raise the size budget"),
            LogLevel::Debug,
        ),
        ScanError::Analyzer(_) => (
            ErrorKind::AnalyzerError,
            true,
            Some("Retry after a short delay"),
            LogLevel::Warn,
        ),
        ScanError::Unauthorized(_) => (
            ErrorKind::Unauthorized,
            false,
            Some("Check the authentication token"),
            LogLevel::Debug,
        ),
        ScanError::InvalidRequest(_) => (
            ErrorKind::InvalidRequest,
            false,
            Some("Check request parameters and try again"),
            LogLevel::Debug,
        ),
        ScanError::NotFound(_) => (
            ErrorKind::NotFound,
            false,
            Some("Verify the file path exists"),
            LogLevel::Debug,
        ),
        ScanError::Cancelled => (ErrorKind::Cancelled, true, None, LogLevel::Debug),
        ScanError::Config(_) => (
            ErrorKind::ConfigError,
            false,
            Some("Fix the service configuration"),
            LogLevel::Error,
        ),
        ScanError::Internal(_) | ScanError::InternalWithSource { .. } => (
            ErrorKind::Internal,
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for ScanError {
    fn error_kind(&self) -> ErrorKind {
        scan_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        scan_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        scan_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            // Internal details stay in the logs.
            ScanError::Internal(_) | ScanError::InternalWithSource { .. } => {
                "An internal error occurred".to_string()
            }
            ScanError::Config(_) => "The service is misconfigured".to_string(),
            other => other.to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        scan_error_static_metadata(self).3
    }
}

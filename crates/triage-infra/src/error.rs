//! Error response shape
//!
//! What a caller sees when a request fails before a verdict exists.

use serde::Serialize;
use triage_core::{ErrorKind, ErrorMetadata, ScanError};

/// Standard error body for request-level failures.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `"error"`, so it never collides with a verdict status.
    pub status: &'static str,
    pub error_kind: ErrorKind,
    pub message: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    pub fn new(error_kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: "error",
            error_kind,
            message: message.into(),
            recoverable: false,
            suggested_action: None,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| {
            format!(
                r#"{{"status":"error","error_kind":"{}","message":"unserializable error"}}"#,
                self.error_kind
            )
        })
    }
}

impl From<&ScanError> for ErrorResponse {
    fn from(err: &ScanError) -> Self {
        Self {
            status: "error",
            error_kind: err.error_kind(),
            message: err.client_message(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action().map(str::to_string),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use super::media_type::{ResolvedType, TypeFamily};
use crate::error::{ErrorKind, ErrorMetadata, ScanError};

/// A request accepted at intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub id: Uuid,
    /// Local file holding the request content (a guard-owned copy for uploads).
    #[serde(skip)]
    pub source: PathBuf,
    pub claimed_name: String,
    pub size_bytes: u64,
    pub received_at: DateTime<Utc>,
}

impl ScanRequest {
    pub fn new(source: PathBuf, claimed_name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            claimed_name: claimed_name.into(),
            size_bytes,
            received_at: Utc::now(),
        }
    }
}

/// Why a target will not be handed to an analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Content matched no known signature.
    UnknownType,
    /// A container nested deeper than the configured maximum.
    DepthExceeded,
    /// A container format that is accepted but cannot be expanded.
    UnsupportedContainer,
}

impl SkipReason {
    pub fn describe(&self) -> &'static str {
        match self {
            SkipReason::UnknownType => "content matched no supported type",
            SkipReason::DepthExceeded => "container nested beyond the maximum depth",
            SkipReason::UnsupportedContainer => "container format cannot be expanded",
        }
    }
}

/// One unit of content discovered for a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanTarget {
    /// Guard-owned file on disk; never exposed in reports.
    #[serde(skip)]
    pub path: PathBuf,
    /// Member name inside its container, or the claimed name for the root.
    pub display_name: String,
    pub resolved_type: Option<ResolvedType>,
    pub origin_depth: u32,
    /// Ancestry from the root archive down to the direct parent.
    pub container_chain: Vec<String>,
    pub size_bytes: u64,
    pub skip_reason: Option<SkipReason>,
}

impl ScanTarget {
    /// A target that can be dispatched.
    pub fn resolved(
        path: PathBuf,
        display_name: impl Into<String>,
        resolved_type: ResolvedType,
        container_chain: Vec<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            path,
            display_name: display_name.into(),
            resolved_type: Some(resolved_type),
            origin_depth: container_chain.len() as u32,
            container_chain,
            size_bytes,
            skip_reason: None,
        }
    }

    /// A target listed for coverage but never analyzed.
    pub fn skipped(
        path: PathBuf,
        display_name: impl Into<String>,
        resolved_type: Option<ResolvedType>,
        container_chain: Vec<String>,
        size_bytes: u64,
        reason: SkipReason,
    ) -> Self {
        Self {
            path,
            display_name: display_name.into(),
            resolved_type,
            origin_depth: container_chain.len() as u32,
            container_chain,
            size_bytes,
            skip_reason: Some(reason),
        }
    }

    pub fn family(&self) -> Option<TypeFamily> {
        self.resolved_type.as_ref().map(|t| t.family)
    }
}

/// Canonical two-key score shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelScores {
    pub primary: f64,
    pub benign: f64,
}

impl LabelScores {
    pub fn new(primary: f64, benign: f64) -> Self {
        Self {
            primary: primary.clamp(0.0, 1.0),
            benign: benign.clamp(0.0, 1.0),
        }
    }

    pub fn exceeds(&self, threshold: f64) -> bool {
        self.primary > threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Ok,
    Unsupported,
    Error,
    /// Not analyzed because an earlier target already flagged the request.
    Skipped,
}

/// Stable error kind plus human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&ScanError> for ErrorDetail {
    fn from(err: &ScanError) -> Self {
        Self::new(err.error_kind(), err.client_message())
    }
}

/// Outcome of dispatching one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub target: ScanTarget,
    pub label_scores: Option<LabelScores>,
    pub status: ScanStatus,
    pub error_detail: Option<ErrorDetail>,
}

impl ScanResult {
    pub fn ok(target: ScanTarget, scores: LabelScores) -> Self {
        Self {
            target,
            label_scores: Some(scores),
            status: ScanStatus::Ok,
            error_detail: None,
        }
    }

    pub fn unsupported(target: ScanTarget, message: impl Into<String>) -> Self {
        Self {
            target,
            label_scores: None,
            status: ScanStatus::Unsupported,
            error_detail: Some(ErrorDetail::new(ErrorKind::UnsupportedType, message)),
        }
    }

    pub fn error(target: ScanTarget, detail: ErrorDetail) -> Self {
        Self {
            target,
            label_scores: None,
            status: ScanStatus::Error,
            error_detail: Some(detail),
        }
    }

    pub fn timed_out(target: ScanTarget) -> Self {
        Self::error(target, ErrorDetail::new(ErrorKind::Timeout, "timeout"))
    }

    pub fn skipped(target: ScanTarget) -> Self {
        Self {
            target,
            label_scores: None,
            status: ScanStatus::Skipped,
            error_detail: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ScanStatus::Ok
    }
}

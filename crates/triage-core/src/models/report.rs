use serde::{Deserialize, Serialize};

use super::media_type::ResolvedType;
use super::scan::{ErrorDetail, LabelScores, ScanStatus, SkipReason};

/// Request-level status. A request that got as far as a verdict is never a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Success,
    Partial,
}

/// One line of the per-file report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub display_name: String,
    pub container_chain: Vec<String>,
    pub resolved_type: Option<ResolvedType>,
    pub size_bytes: u64,
    pub label_scores: Option<LabelScores>,
    pub flagged: bool,
    pub status: ScanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

/// Merged outcome of one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub status: VerdictStatus,
    pub overall_flag: bool,
    pub truncated: bool,
    pub rejected_members: Vec<String>,
    pub per_file_report: Vec<FileReport>,
}

impl Verdict {
    pub fn total_files(&self) -> usize {
        self.per_file_report.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleFileEnvelope {
    pub status: VerdictStatus,
    pub filename: String,
    pub overall_flag: bool,
    pub result: FileReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveEnvelope {
    pub status: VerdictStatus,
    pub filename: String,
    pub total_files: usize,
    pub overall_flag: bool,
    pub truncated: bool,
    pub rejected_members: Vec<String>,
    pub per_file_report: Vec<FileReport>,
}

/// Response body returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScanEnvelope {
    Archive(ArchiveEnvelope),
    Single(SingleFileEnvelope),
}

impl ScanEnvelope {
    pub fn status(&self) -> VerdictStatus {
        match self {
            ScanEnvelope::Archive(e) => e.status,
            ScanEnvelope::Single(e) => e.status,
        }
    }

    pub fn overall_flag(&self) -> bool {
        match self {
            ScanEnvelope::Archive(e) => e.overall_flag,
            ScanEnvelope::Single(e) => e.overall_flag,
        }
    }

    /// Per-file lines regardless of envelope shape.
    pub fn reports(&self) -> Vec<&FileReport> {
        match self {
            ScanEnvelope::Archive(e) => e.per_file_report.iter().collect(),
            ScanEnvelope::Single(e) => vec![&e.result],
        }
    }
}

use serde::{Deserialize, Serialize};

use super::scan::{ScanRequest, ScanTarget};

/// Structured record of every file discovered while expanding one request,
/// including skipped and unsupported entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveManifest {
    pub root_request: ScanRequest,
    pub ordered_targets: Vec<ScanTarget>,
    pub total_extracted_bytes: u64,
    /// Expansion stopped early because a size or entry cap was reached.
    pub truncated: bool,
    /// Member names dropped by the path-traversal check.
    pub rejected_members: Vec<String>,
}

impl ArchiveManifest {
    pub fn new(root_request: ScanRequest) -> Self {
        Self {
            root_request,
            ordered_targets: Vec::new(),
            total_extracted_bytes: 0,
            truncated: false,
            rejected_members: Vec::new(),
        }
    }

    /// Manifest for a request that is not a container: the request itself is the only target.
    pub fn single(root_request: ScanRequest, target: ScanTarget) -> Self {
        Self {
            root_request,
            ordered_targets: vec![target],
            total_extracted_bytes: 0,
            truncated: false,
            rejected_members: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.ordered_targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_targets.is_empty()
    }
}

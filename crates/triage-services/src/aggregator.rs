//! Merges per-target results into the request verdict.

use triage_core::{
    ArchiveEnvelope, ArchiveManifest, FileReport, ScanEnvelope, ScanResult, ScanStatus,
    SingleFileEnvelope, Verdict, VerdictStatus,
};

#[derive(Debug, Clone, Copy)]
pub struct ResultAggregator {
    threshold: f64,
}

impl ResultAggregator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True when the result's primary score is strictly above the threshold.
    pub fn is_flagged(&self, result: &ScanResult) -> bool {
        result
            .label_scores
            .is_some_and(|scores| scores.exceeds(self.threshold))
    }

    /// Build the verdict. Reports keep the order of `results`.
    ///
    /// `success` requires every target to be ok and nothing to be missing
    /// from the manifest; anything less is `partial`, never a failure.
    pub fn aggregate(&self, manifest: &ArchiveManifest, results: Vec<ScanResult>) -> Verdict {
        let all_ok = results.iter().all(|r| r.status == ScanStatus::Ok);
        let complete = !manifest.truncated && manifest.rejected_members.is_empty();
        let status = if all_ok && complete {
            VerdictStatus::Success
        } else {
            VerdictStatus::Partial
        };

        let per_file_report: Vec<FileReport> =
            results.into_iter().map(|r| self.report(r)).collect();
        let overall_flag = per_file_report.iter().any(|r| r.flagged);

        Verdict {
            status,
            overall_flag,
            truncated: manifest.truncated,
            rejected_members: manifest.rejected_members.clone(),
            per_file_report,
        }
    }

    fn report(&self, result: ScanResult) -> FileReport {
        let flagged = self.is_flagged(&result);
        let target = result.target;
        FileReport {
            display_name: target.display_name,
            container_chain: target.container_chain,
            resolved_type: target.resolved_type,
            size_bytes: target.size_bytes,
            label_scores: result.label_scores,
            flagged,
            status: result.status,
            skip_reason: target.skip_reason,
            error: result.error_detail,
        }
    }

    /// Shape the verdict for the caller.
    ///
    /// A request that was not expanded yields the single-file envelope.
    pub fn envelope(&self, verdict: Verdict, filename: &str, expanded: bool) -> ScanEnvelope {
        if !expanded && verdict.per_file_report.len() == 1 {
            let mut verdict = verdict;
            if let Some(result) = verdict.per_file_report.pop() {
                return ScanEnvelope::Single(SingleFileEnvelope {
                    status: verdict.status,
                    filename: filename.to_string(),
                    overall_flag: verdict.overall_flag,
                    result,
                });
            }
            return self.archive_envelope(verdict, filename);
        }
        self.archive_envelope(verdict, filename)
    }

    fn archive_envelope(&self, verdict: Verdict, filename: &str) -> ScanEnvelope {
        ScanEnvelope::Archive(ArchiveEnvelope {
            status: verdict.status,
            filename: filename.to_string(),
            total_files: verdict.total_files(),
            overall_flag: verdict.overall_flag,
            truncated: verdict.truncated,
            rejected_members: verdict.rejected_members,
            per_file_report: verdict.per_file_report,
        })
    }
}

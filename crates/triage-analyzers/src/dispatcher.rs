//! Routes scan targets to analyzers and normalizes their output.

use std::time::Instant;

use triage_core::{ErrorDetail, ErrorKind, ScanResult, ScanTarget};
use triage_processing::ResourceGuard;

use crate::labels::LabelNormalizer;
use crate::registry::AnalyzerRegistry;

#[derive(Clone)]
pub struct Dispatcher {
    registry: AnalyzerRegistry,
    normalizer: LabelNormalizer,
}

impl Dispatcher {
    pub fn new(registry: AnalyzerRegistry, normalizer: LabelNormalizer) -> Self {
        Self {
            registry,
            normalizer,
        }
    }

    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }

    /// Analyze one target. Never fails: every outcome is a [`ScanResult`].
    pub async fn dispatch(&self, target: ScanTarget, guard: &ResourceGuard) -> ScanResult {
        if let Some(reason) = target.skip_reason {
            return ScanResult::unsupported(target, reason.describe());
        }

        let Some(family) = target.family() else {
            return ScanResult::unsupported(target, "type could not be resolved");
        };

        let Some(analyzer) = self.registry.get(family).await else {
            tracing::debug!(file = %target.display_name, family = %family, "No analyzer registered");
            return ScanResult::unsupported(target, format!("no analyzer for {} content", family));
        };

        let started = Instant::now();
        match analyzer.analyze(&target, guard).await {
            Ok(raw) => {
                let scores = self.normalizer.normalize(&raw);
                tracing::debug!(
                    file = %target.display_name,
                    analyzer = %analyzer.name(),
                    primary = scores.primary,
                    benign = scores.benign,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Target analyzed"
                );
                ScanResult::ok(target, scores)
            }
            Err(e) => {
                tracing::warn!(
                    file = %target.display_name,
                    analyzer = %analyzer.name(),
                    error = %e,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Analyzer failed"
                );
                ScanResult::error(target, ErrorDetail::new(ErrorKind::AnalyzerError, e.to_string()))
            }
        }
    }
}

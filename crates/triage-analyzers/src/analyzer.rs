//! Analyzer contracts
//!
//! An [`Analyzer`] turns one scan target into a raw label→score mapping.
//! Analyzers decode their family's container format themselves and hand
//! pixels to a [`Classifier`], which is the only piece that does inference.

use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

use triage_core::{ScanTarget, TypeFamily};
use triage_processing::ResourceGuard;

use crate::error::AnalyzerError;

/// Label → score as reported by a classifier, before normalization.
pub type RawScores = BTreeMap<String, f64>;

/// Description of a registered analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerInfo {
    pub name: String,
    pub family: TypeFamily,
    pub description: String,
}

/// Produces label scores for every target of one type family.
#[async_trait]
pub trait Analyzer: Send + Sync + Debug {
    /// Stable analyzer name used in logs.
    fn name(&self) -> &str;

    /// Family this analyzer is registered for.
    fn family(&self) -> TypeFamily;

    /// Analyze one target.
    ///
    /// Temporary artifacts (sampled frames, carved images) must be created
    /// through `guard` so they are removed with the rest of the request.
    async fn analyze(
        &self,
        target: &ScanTarget,
        guard: &ResourceGuard,
    ) -> Result<RawScores, AnalyzerError>;
}

/// Pretrained image classifier: decoded pixels in, label scores out.
#[async_trait]
pub trait Classifier: Send + Sync + Debug {
    fn name(&self) -> &str;

    async fn classify(&self, image: &DynamicImage) -> Result<RawScores, AnalyzerError>;
}

/// Fold `scores` into `into`, keeping the maximum per label.
pub fn merge_max(into: &mut RawScores, scores: RawScores) {
    for (label, score) in scores {
        if !score.is_finite() {
            continue;
        }
        into.entry(label)
            .and_modify(|current| {
                if score > *current {
                    *current = score;
                }
            })
            .or_insert(score);
    }
}

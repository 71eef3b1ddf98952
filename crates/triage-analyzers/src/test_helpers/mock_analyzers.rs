use async_trait::async_trait;
use image::DynamicImage;
use std::sync::Mutex;

use triage_core::{ScanTarget, TypeFamily};
use triage_processing::ResourceGuard;

use crate::analyzer::{Analyzer, Classifier, RawScores};
use crate::error::AnalyzerError;

fn to_scores(pairs: &[(&str, f64)]) -> RawScores {
    pairs.iter().map(|(label, score)| (label.to_string(), *score)).collect()
}

/// Classifier that returns the same scores for every image.
#[derive(Debug)]
pub struct StaticClassifier {
    name: String,
    scores: RawScores,
}

impl StaticClassifier {
    pub fn new(pairs: &[(&str, f64)]) -> Self {
        Self {
            name: "static".to_string(),
            scores: to_scores(pairs),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scores: RawScores::new(),
        }
    }
}

#[async_trait]
impl Classifier for StaticClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(&self, _image: &DynamicImage) -> Result<RawScores, AnalyzerError> {
        Ok(self.scores.clone())
    }
}

/// Classifier that replays a script, one entry per call.
#[derive(Debug)]
pub struct SequenceClassifier {
    script: Mutex<Vec<RawScores>>,
}

impl SequenceClassifier {
    pub fn new(script: Vec<Vec<(&str, f64)>>) -> Self {
        let mut script: Vec<RawScores> = script.iter().map(|pairs| to_scores(pairs)).collect();
        script.reverse();
        Self {
            script: Mutex::new(script),
        }
    }
}

#[async_trait]
impl Classifier for SequenceClassifier {
    fn name(&self) -> &str {
        "sequence"
    }

    async fn classify(&self, _image: &DynamicImage) -> Result<RawScores, AnalyzerError> {
        self.script
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| AnalyzerError::Classifier("script exhausted".to_string()))
    }
}

/// Analyzer that reports fixed scores without reading the target.
#[derive(Debug)]
pub struct FixedAnalyzer {
    family: TypeFamily,
    scores: RawScores,
}

impl FixedAnalyzer {
    pub fn new(family: TypeFamily, pairs: &[(&str, f64)]) -> Self {
        Self {
            family,
            scores: to_scores(pairs),
        }
    }
}

#[async_trait]
impl Analyzer for FixedAnalyzer {
    fn name(&self) -> &str {
        "fixed"
    }

    fn family(&self) -> TypeFamily {
        self.family
    }

    async fn analyze(
        &self,
        _target: &ScanTarget,
        _guard: &ResourceGuard,
    ) -> Result<RawScores, AnalyzerError> {
        Ok(self.scores.clone())
    }
}

/// Analyzer that always fails with a classifier error.
#[derive(Debug)]
pub struct FailingAnalyzer {
    family: TypeFamily,
    message: String,
}

impl FailingAnalyzer {
    pub fn new(family: TypeFamily, message: impl Into<String>) -> Self {
        Self {
            family,
            message: message.into(),
        }
    }
}

#[async_trait]
impl Analyzer for FailingAnalyzer {
    fn name(&self) -> &str {
        "failing"
    }

    fn family(&self) -> TypeFamily {
        self.family
    }

    async fn analyze(
        &self,
        _target: &ScanTarget,
        _guard: &ResourceGuard,
    ) -> Result<RawScores, AnalyzerError> {
        Err(AnalyzerError::Classifier(self.message.clone()))
    }
}

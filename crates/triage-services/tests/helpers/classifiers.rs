use async_trait::async_trait;
use image::DynamicImage;
use std::sync::atomic::{AtomicUsize, Ordering};

use triage_analyzers::{AnalyzerError, Classifier, RawScores};

/// Images exactly this wide are scored as explicit.
pub const FLAG_WIDTH: u32 = 13;

/// Scores by image width so fixtures can choose their verdict.
#[derive(Debug, Default)]
pub struct WidthClassifier {
    calls: AtomicUsize,
}

impl WidthClassifier {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for WidthClassifier {
    fn name(&self) -> &str {
        "width"
    }

    async fn classify(&self, image: &DynamicImage) -> Result<RawScores, AnalyzerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (porn, neutral) = if image.width() == FLAG_WIDTH {
            (0.97, 0.02)
        } else {
            (0.03, 0.95)
        };
        Ok([("porn".to_string(), porn), ("neutral".to_string(), neutral)]
            .into_iter()
            .collect())
    }
}

/// Never answers within a test's lifetime.
#[derive(Debug, Default)]
pub struct StalledClassifier;

#[async_trait]
impl Classifier for StalledClassifier {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn classify(&self, _image: &DynamicImage) -> Result<RawScores, AnalyzerError> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(RawScores::new())
    }
}

//! Test helpers: build a ScanService wired to an in-process classifier.
//!
//! Run from workspace root: `cargo test -p triage-services --test pipeline_test`.

pub mod classifiers;
pub mod fixtures;

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use triage_analyzers::{AnalyzerPool, Classifier};
use triage_core::TriageConfig;
use triage_services::ScanService;

pub use classifiers::WidthClassifier;

pub const TOKEN: &str = "test-token";

/// Service plus the directories it works in.
pub struct TestApp {
    pub service: ScanService,
    /// Where test inputs are written.
    pub input_dir: TempDir,
    /// Base directory for the service's temporary files.
    pub work_dir: TempDir,
}

impl TestApp {
    /// Write `bytes` into the input directory and return the path.
    pub fn input(&self, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = self.input_dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    /// Entries left behind in the work directory.
    pub fn leftovers(&self) -> usize {
        std::fs::read_dir(self.work_dir.path()).unwrap().count()
    }
}

pub fn test_config(work_dir: &Path) -> TriageConfig {
    TriageConfig {
        auth_tokens: vec![TOKEN.to_string()],
        temp_dir: Some(work_dir.to_path_buf()),
        ..TriageConfig::default()
    }
}

pub async fn setup_app_with(
    classifier: Arc<dyn Classifier>,
    configure: impl FnOnce(&mut TriageConfig),
) -> TestApp {
    let input_dir = tempfile::tempdir().unwrap();
    let work_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(work_dir.path());
    configure(&mut config);

    let pool = Arc::new(AnalyzerPool::with_classifier(classifier));
    let service = ScanService::with_pool(config, pool).await.unwrap();
    TestApp {
        service,
        input_dir,
        work_dir,
    }
}

pub async fn setup_app() -> TestApp {
    setup_app_with(Arc::new(WidthClassifier::default()), |_| {}).await
}

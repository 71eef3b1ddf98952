//! Shared classifier instance with periodic rebuild.
//!
//! The pool is built once at startup and shared by `Arc`. Every
//! `reset_threshold` uses it asks the factory for a fresh classifier and
//! swaps it in. Callers already holding the old instance finish with it.

use image::DynamicImage;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::analyzer::{Classifier, RawScores};
use crate::error::AnalyzerError;

pub const DEFAULT_RESET_THRESHOLD: u64 = 10_000;

pub type ClassifierFactory =
    Box<dyn Fn() -> Result<Arc<dyn Classifier>, AnalyzerError> + Send + Sync>;

pub struct AnalyzerPool {
    current: RwLock<Arc<dyn Classifier>>,
    factory: ClassifierFactory,
    reset_threshold: u64,
    uses: AtomicU64,
    generation: AtomicU64,
}

impl fmt::Debug for AnalyzerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerPool")
            .field("classifier", &self.read().name())
            .field("reset_threshold", &self.reset_threshold)
            .field("uses", &self.uses())
            .field("generation", &self.generation())
            .finish()
    }
}

impl AnalyzerPool {
    /// Build the pool, constructing the first classifier immediately.
    pub fn new(factory: ClassifierFactory, reset_threshold: u64) -> Result<Self, AnalyzerError> {
        let initial = factory()?;
        tracing::info!(
            classifier = %initial.name(),
            reset_threshold,
            "Analyzer pool initialized"
        );
        Ok(Self {
            current: RwLock::new(initial),
            factory,
            reset_threshold: reset_threshold.max(1),
            uses: AtomicU64::new(0),
            generation: AtomicU64::new(0),
        })
    }

    /// Pool around a classifier that has no meaningful rebuild.
    pub fn with_classifier(classifier: Arc<dyn Classifier>) -> Self {
        let shared = Arc::clone(&classifier);
        Self {
            current: RwLock::new(classifier),
            factory: Box::new(move || -> Result<Arc<dyn Classifier>, AnalyzerError> {
                Ok(Arc::clone(&shared))
            }),
            reset_threshold: DEFAULT_RESET_THRESHOLD,
            uses: AtomicU64::new(0),
            generation: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Arc<dyn Classifier>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arc<dyn Classifier>> {
        self.current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count one use and return the classifier to run it with.
    pub fn acquire(&self) -> Arc<dyn Classifier> {
        let used = self.uses.fetch_add(1, Ordering::AcqRel) + 1;
        // fetch_add hands each multiple of the threshold to exactly one caller
        if used % self.reset_threshold == 0 {
            self.rebuild(used);
        }
        Arc::clone(&self.read())
    }

    fn rebuild(&self, used: u64) {
        match (self.factory)() {
            Ok(fresh) => {
                *self.write() = fresh;
                let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
                tracing::info!(uses = used, generation, "Classifier instance rebuilt");
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    uses = used,
                    "Classifier rebuild failed, keeping previous instance"
                );
            }
        }
    }

    /// Classify one image with the current instance.
    pub async fn classify(&self, image: &DynamicImage) -> Result<RawScores, AnalyzerError> {
        let classifier = self.acquire();
        classifier.classify(image).await
    }

    pub fn uses(&self) -> u64 {
        self.uses.load(Ordering::Acquire)
    }

    /// Number of successful rebuilds so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn reset_threshold(&self) -> u64 {
        self.reset_threshold
    }
}

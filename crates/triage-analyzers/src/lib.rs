//! Triage Analyzers Library
//!
//! Everything between a typed scan target and its `{primary, benign}`
//! scores: the analyzer and classifier contracts, the shared classifier
//! pool, the family registry, the dispatcher and the built-in analyzers.

pub mod analyzer;
pub mod analyzers;
pub mod dispatcher;
pub mod error;
#[cfg(feature = "http-classifier")]
pub mod http_classifier;
pub mod labels;
pub mod pool;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use analyzer::{merge_max, Analyzer, AnalyzerInfo, Classifier, RawScores};
pub use analyzers::{DocumentAnalyzer, FrameSampling, ImageAnalyzer, VideoAnalyzer};
pub use dispatcher::Dispatcher;
pub use error::AnalyzerError;
#[cfg(feature = "http-classifier")]
pub use http_classifier::HttpClassifier;
pub use labels::LabelNormalizer;
pub use pool::{AnalyzerPool, ClassifierFactory};
pub use registry::AnalyzerRegistry;

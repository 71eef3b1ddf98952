//! Triage Core Library
//!
//! This crate provides the data model, error taxonomy, configuration and the
//! MIME table shared by every stage of the intake and dispatch pipeline.

pub mod config;
pub mod error;
pub mod mime_table;
pub mod models;

// Re-export commonly used types
pub use config::TriageConfig;
pub use error::{ErrorKind, ErrorMetadata, LogLevel, ScanError};
pub use models::{
    ArchiveEnvelope, ArchiveManifest, ErrorDetail, FileReport, LabelScores, ResolutionSource,
    ResolvedType, ScanEnvelope, ScanRequest, ScanResult, ScanStatus, ScanTarget,
    SingleFileEnvelope, SkipReason, TypeFamily, Verdict, VerdictStatus,
};

//! Data models for the scan pipeline
//!
//! Each sub-module represents one stage of a request: type resolution,
//! scan targets and results, the archive manifest, and the final report.

mod manifest;
mod media_type;
mod report;
mod scan;

pub use manifest::*;
pub use media_type::*;
pub use report::*;
pub use scan::*;

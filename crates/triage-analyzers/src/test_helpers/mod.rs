//! Test helpers for analyzer unit tests
//!
//! Scripted classifiers and analyzers plus small in-memory image fixtures,
//! so analyzers can be exercised without a model or external tools.

pub mod fixtures;
pub mod mock_analyzers;

pub use fixtures::*;
pub use mock_analyzers::*;

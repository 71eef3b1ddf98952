//! Per-family analyzers

pub mod document;
pub mod image;
pub mod video;

pub use self::document::DocumentAnalyzer;
pub use self::image::ImageAnalyzer;
pub use self::video::{FrameSampling, VideoAnalyzer};

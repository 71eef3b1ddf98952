//! Still-image analyzer

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::sync::Arc;

use triage_core::{ScanTarget, TypeFamily};
use triage_processing::ResourceGuard;

use crate::analyzer::{Analyzer, RawScores};
use crate::error::AnalyzerError;
use crate::pool::AnalyzerPool;

#[derive(Debug)]
pub struct ImageAnalyzer {
    pool: Arc<AnalyzerPool>,
}

impl ImageAnalyzer {
    pub fn new(pool: Arc<AnalyzerPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Analyzer for ImageAnalyzer {
    fn name(&self) -> &str {
        "image"
    }

    fn family(&self) -> TypeFamily {
        TypeFamily::Image
    }

    async fn analyze(
        &self,
        target: &ScanTarget,
        _guard: &ResourceGuard,
    ) -> Result<RawScores, AnalyzerError> {
        let bytes = tokio::fs::read(&target.path).await?;
        let extension = target.resolved_type.as_ref().map(|t| t.extension.clone());

        let image = decode_owned(bytes, extension).await?;
        self.pool.classify(&image).await
    }
}

/// Decode on the blocking pool.
pub(crate) async fn decode_owned(
    bytes: Vec<u8>,
    extension: Option<String>,
) -> Result<DynamicImage, AnalyzerError> {
    tokio::task::spawn_blocking(move || decode_bytes(&bytes, extension.as_deref())).await?
}

/// Decode an image, guessing the format from content first.
///
/// Formats without a magic number (TGA) fall back to the extension.
pub(crate) fn decode_bytes(
    bytes: &[u8],
    extension: Option<&str>,
) -> Result<DynamicImage, AnalyzerError> {
    let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    if reader.format().is_none() {
        let hinted = extension
            .map(|ext| ext.trim_start_matches('.'))
            .and_then(ImageFormat::from_extension);
        match hinted {
            Some(format) => reader.set_format(format),
            None => {
                return Err(AnalyzerError::Decode(
                    "image format not recognized".to_string(),
                ))
            }
        }
    }
    Ok(reader.decode()?)
}

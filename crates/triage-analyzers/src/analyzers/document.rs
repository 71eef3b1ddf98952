//! Document analyzer
//!
//! Documents are judged by the images they embed. DOCX files carry them as
//! `word/media/*` zip members; for PDF and legacy DOC the raw JPEG and PNG
//! streams are carved out of the file bytes.

use async_trait::async_trait;
use std::io::{Cursor, Read};
use std::sync::Arc;

use triage_core::{ScanTarget, TypeFamily};
use triage_processing::sniffer::WORD_MEDIA_PREFIX;
use triage_processing::ResourceGuard;

use super::image::decode_owned;
use crate::analyzer::{merge_max, Analyzer, RawScores};
use crate::error::AnalyzerError;
use crate::pool::AnalyzerPool;

pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const DEFAULT_MAX_IMAGES: usize = 64;

const MEDIA_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp"];
/// Largest single embedded image that will be pulled out.
const MAX_EMBEDDED_BYTES: u64 = 32 * 1024 * 1024;

const JPEG_START: &[u8] = &[0xFF, 0xD8, 0xFF];
const JPEG_END: &[u8] = &[0xFF, 0xD9];
const PNG_START: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const PNG_END: &[u8] = b"IEND";

#[derive(Debug)]
pub struct DocumentAnalyzer {
    pool: Arc<AnalyzerPool>,
    max_images: usize,
}

impl DocumentAnalyzer {
    pub fn new(pool: Arc<AnalyzerPool>) -> Self {
        Self {
            pool,
            max_images: DEFAULT_MAX_IMAGES,
        }
    }

    pub fn with_max_images(mut self, max_images: usize) -> Self {
        self.max_images = max_images.max(1);
        self
    }
}

#[async_trait]
impl Analyzer for DocumentAnalyzer {
    fn name(&self) -> &str {
        "document"
    }

    fn family(&self) -> TypeFamily {
        TypeFamily::Document
    }

    async fn analyze(
        &self,
        target: &ScanTarget,
        _guard: &ResourceGuard,
    ) -> Result<RawScores, AnalyzerError> {
        let bytes = tokio::fs::read(&target.path).await?;
        let mime = target
            .resolved_type
            .as_ref()
            .map(|t| t.mime.clone())
            .unwrap_or_default();
        let max_images = self.max_images;

        let images =
            tokio::task::spawn_blocking(move || embedded_images(&bytes, &mime, max_images))
                .await??;

        let found = images.len();
        let mut scores = RawScores::new();
        let mut classified = 0usize;
        for image_bytes in images {
            match decode_owned(image_bytes, None).await {
                Ok(image) => {
                    merge_max(&mut scores, self.pool.classify(&image).await?);
                    classified += 1;
                }
                Err(e) => {
                    tracing::debug!(file = %target.display_name, error = %e, "Skipping embedded image");
                }
            }
        }

        // No usable images leaves the map empty, which normalizes to primary = 0.
        tracing::debug!(
            file = %target.display_name,
            found,
            classified,
            "Document images classified"
        );
        Ok(scores)
    }
}

/// Embedded image streams in document order, at most `max_images`.
pub fn embedded_images(
    bytes: &[u8],
    mime: &str,
    max_images: usize,
) -> Result<Vec<Vec<u8>>, AnalyzerError> {
    if mime.eq_ignore_ascii_case(DOCX_MIME) {
        docx_media(bytes, max_images)
    } else {
        Ok(carve_images(bytes, max_images))
    }
}

fn docx_media(bytes: &[u8], max_images: usize) -> Result<Vec<Vec<u8>>, AnalyzerError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AnalyzerError::Decode(format!("unreadable docx package: {}", e)))?;

    let mut media = Vec::new();
    for index in 0..archive.len() {
        if media.len() >= max_images {
            break;
        }
        let member = archive
            .by_index(index)
            .map_err(|e| AnalyzerError::Decode(format!("unreadable docx member: {}", e)))?;
        if !member.is_file() || !is_media_member(member.name()) {
            continue;
        }

        let mut data = Vec::new();
        member.take(MAX_EMBEDDED_BYTES).read_to_end(&mut data)?;
        media.push(data);
    }
    Ok(media)
}

fn is_media_member(name: &str) -> bool {
    let Some(file) = name.strip_prefix(WORD_MEDIA_PREFIX) else {
        return false;
    };
    file.rsplit_once('.')
        .map(|(_, ext)| MEDIA_EXTENSIONS.iter().any(|m| m.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Carve JPEG and PNG streams out of raw bytes.
pub fn carve_images(bytes: &[u8], max_images: usize) -> Vec<Vec<u8>> {
    let mut images = Vec::new();
    let mut pos = 0;

    while images.len() < max_images {
        let next_jpeg = find(bytes, JPEG_START, pos);
        let next_png = find(bytes, PNG_START, pos);

        let (start, end) = match (next_jpeg, next_png) {
            (Some(j), Some(p)) if p < j => (p, png_end(bytes, p)),
            (Some(j), _) => (j, find(bytes, JPEG_END, j + JPEG_START.len()).map(|e| e + JPEG_END.len())),
            (None, Some(p)) => (p, png_end(bytes, p)),
            (None, None) => break,
        };

        match end {
            Some(end) => {
                images.push(bytes[start..end].to_vec());
                pos = end;
            }
            // Unterminated stream: skip past its marker and keep looking.
            None => pos = start + 1,
        }
    }
    images
}

/// PNG ends with the IEND chunk type followed by a 4-byte CRC.
fn png_end(bytes: &[u8], start: usize) -> Option<usize> {
    let iend = find(bytes, PNG_END, start + PNG_START.len())?;
    let end = iend + PNG_END.len() + 4;
    (end <= bytes.len()).then_some(end)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{jpeg_bytes, png_bytes, target_at, StaticClassifier};
    use std::io::Write;
    use zip::write::FileOptions;

    fn docx_with(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            for (name, data) in members {
                writer.start_file(*name, FileOptions::default()).unwrap();
                writer.write_all(data).unwrap();
            }
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    fn analyzer() -> DocumentAnalyzer {
        let classifier = StaticClassifier::new(&[("porn", 0.88), ("neutral", 0.1)]);
        DocumentAnalyzer::new(Arc::new(AnalyzerPool::with_classifier(Arc::new(classifier))))
    }

    #[test]
    fn carves_jpeg_and_png_in_order() {
        let png = png_bytes(2, 2);
        let jpeg = jpeg_bytes(8, 8);
        let mut pdf = b"%PDF-1.4\n1 0 obj<</Filter/DCTDecode>>stream\n".to_vec();
        pdf.extend_from_slice(&png);
        pdf.extend_from_slice(b"\nendstream\n2 0 obj stream\n");
        pdf.extend_from_slice(&jpeg);
        pdf.extend_from_slice(b"\nendstream\n%%EOF");

        let images = carve_images(&pdf, 10);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0], png);
        assert_eq!(images[1], jpeg);
    }

    #[test]
    fn carving_respects_the_image_cap() {
        let jpeg = jpeg_bytes(4, 4);
        let blob: Vec<u8> = jpeg.iter().chain(jpeg.iter()).chain(jpeg.iter()).copied().collect();
        assert_eq!(carve_images(&blob, 2).len(), 2);
    }

    #[test]
    fn unterminated_streams_are_ignored() {
        let mut blob = b"junk".to_vec();
        blob.extend_from_slice(PNG_START);
        blob.extend_from_slice(b"no end chunk here");
        assert!(carve_images(&blob, 10).is_empty());
        assert!(carve_images(b"", 10).is_empty());
    }

    #[test]
    fn docx_media_members_only() {
        let png = png_bytes(2, 2);
        let docx = docx_with(&[
            ("[Content_Types].xml", b"<Types/>"),
            ("word/document.xml", b"<w:document/>"),
            ("word/media/image1.png", &png),
            ("word/media/image2.emf", b"emf"),
            ("word/mediaevil/image3.png", &png),
        ]);

        let images = embedded_images(&docx, DOCX_MIME, 10).unwrap();
        assert_eq!(images, vec![png]);
    }

    #[test]
    fn broken_docx_package_is_an_error() {
        let err = embedded_images(b"PK\x03\x04 truncated", DOCX_MIME, 10).unwrap_err();
        assert!(matches!(err, AnalyzerError::Decode(_)));
    }

    #[tokio::test]
    async fn document_without_images_scores_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.pdf");
        std::fs::write(&path, b"%PDF-1.7\n(hello world)\n%%EOF").unwrap();
        let target = target_at(&path, TypeFamily::Document, "application/pdf", ".pdf");

        let guard = ResourceGuard::in_dir(dir.path());
        let scores = analyzer().analyze(&target, &guard).await.unwrap();
        assert!(scores.is_empty());
    }

    #[tokio::test]
    async fn docx_images_are_classified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.docx");
        std::fs::write(&path, docx_with(&[("word/media/image1.png", &png_bytes(3, 3))])).unwrap();
        let target = target_at(&path, TypeFamily::Document, DOCX_MIME, ".docx");

        let guard = ResourceGuard::in_dir(dir.path());
        let scores = analyzer().analyze(&target, &guard).await.unwrap();
        assert_eq!(scores.get("porn"), Some(&0.88));
    }
}

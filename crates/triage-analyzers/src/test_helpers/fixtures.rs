use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use triage_core::{ResolutionSource, ResolvedType, ScanTarget, TypeFamily};

fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let pixels = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 40) as u8, (y * 40) as u8, 128]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(pixels)
        .write_to(&mut buf, format)
        .expect("encode fixture image");
    buf.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded(width, height, ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded(width, height, ImageFormat::Jpeg)
}

/// Resolved target pointing at a real file.
pub fn target_at(path: &Path, family: TypeFamily, mime: &str, extension: &str) -> ScanTarget {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    ScanTarget::resolved(
        path.to_path_buf(),
        name,
        ResolvedType::new(family, mime, extension, ResolutionSource::Sniffed),
        vec![],
        std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
    )
}

/// PNG target whose path is never read.
pub fn image_target(name: &str) -> ScanTarget {
    ScanTarget::resolved(
        PathBuf::from(name),
        name,
        ResolvedType::new(TypeFamily::Image, "image/png", ".png", ResolutionSource::Sniffed),
        vec![],
        1024,
    )
}

//! Fixed MIME ↔ extension table.
//!
//! This table is the contract clients rely on to know which inputs are
//! accepted. It governs both sniffing acceptance and analyzer-family
//! selection. Extensions are stored lowercase with a leading dot.

use crate::models::TypeFamily;

/// One row of the MIME table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MimeEntry {
    pub mime: &'static str,
    pub extension: &'static str,
    pub family: TypeFamily,
}

const fn entry(mime: &'static str, extension: &'static str, family: TypeFamily) -> MimeEntry {
    MimeEntry {
        mime,
        extension,
        family,
    }
}

use crate::models::TypeFamily::{Archive, Document, Image, Video};

/// Canonical rows: each MIME type maps to exactly one extension.
pub const MIME_TABLE: &[MimeEntry] = &[
    // Images
    entry("image/jpeg", ".jpg", Image),
    entry("image/png", ".png", Image),
    entry("image/gif", ".gif", Image),
    entry("image/webp", ".webp", Image),
    entry("image/bmp", ".bmp", Image),
    entry("image/tiff", ".tiff", Image),
    entry("image/x-tiff", ".tiff", Image),
    entry("image/x-tga", ".tga", Image),
    entry("image/x-portable-pixmap", ".ppm", Image),
    entry("image/x-portable-graymap", ".pgm", Image),
    entry("image/x-portable-bitmap", ".pbm", Image),
    entry("image/x-portable-anymap", ".pnm", Image),
    entry("image/svg+xml", ".svg", Image),
    entry("image/x-pcx", ".pcx", Image),
    entry("image/vnd.adobe.photoshop", ".psd", Image),
    entry("image/vnd.microsoft.icon", ".ico", Image),
    entry("image/heif", ".heif", Image),
    entry("image/heic", ".heic", Image),
    entry("image/avif", ".avif", Image),
    entry("image/jxl", ".jxl", Image),
    // PDF
    entry("application/pdf", ".pdf", Document),
    // Office documents
    entry("application/msword", ".doc", Document),
    entry(
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
        Document,
    ),
    // Videos
    entry("video/mp4", ".mp4", Video),
    entry("video/x-msvideo", ".avi", Video),
    entry("video/x-matroska", ".mkv", Video),
    entry("video/quicktime", ".mov", Video),
    entry("video/x-ms-wmv", ".wmv", Video),
    entry("video/webm", ".webm", Video),
    entry("video/MP2T", ".ts", Video),
    entry("video/x-flv", ".flv", Video),
    entry("video/3gpp", ".3gp", Video),
    entry("video/3gpp2", ".3g2", Video),
    entry("video/x-m4v", ".m4v", Video),
    entry("video/mxf", ".mxf", Video),
    entry("video/x-ogm", ".ogm", Video),
    entry("video/vnd.rn-realvideo", ".rv", Video),
    entry("video/dv", ".dv", Video),
    entry("video/x-ms-asf", ".asf", Video),
    entry("video/x-f4v", ".f4v", Video),
    entry("video/vnd.dlna.mpeg-tts", ".m2ts", Video),
    entry("video/x-raw", ".yuv", Video),
    entry("video/mpeg", ".mpg", Video),
    entry("video/x-mpeg", ".mpeg", Video),
    entry("video/divx", ".divx", Video),
    entry("video/x-vob", ".vob", Video),
    entry("video/x-m2v", ".m2v", Video),
    // Archives
    entry("application/x-rar-compressed", ".rar", Archive),
    entry("application/x-rar", ".rar", Archive),
    entry("application/vnd.rar", ".rar", Archive),
    entry("application/zip", ".zip", Archive),
    entry("application/x-7z-compressed", ".7z", Archive),
    entry("application/gzip", ".gz", Archive),
    entry("application/x-tar", ".tar", Archive),
    entry("application/x-bzip2", ".bz2", Archive),
    entry("application/x-xz", ".xz", Archive),
    entry("application/x-lzma", ".lzma", Archive),
    entry("application/x-zstd", ".zst", Archive),
    entry("application/vnd.ms-cab-compressed", ".cab", Archive),
];

/// Extra spellings accepted for an existing MIME type.
const EXTENSION_ALIASES: &[(&str, &str)] = &[(".jpeg", "image/jpeg"), (".tif", "image/tiff")];

/// Normalize an extension or filename suffix to `.ext` lowercase form.
pub fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('.');
    format!(".{}", trimmed.to_ascii_lowercase())
}

/// Extract the normalized extension from a claimed filename, if any.
pub fn extension_of(filename: &str) -> Option<String> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(normalize_extension(ext))
}

/// Look up the table row for a MIME type (case-insensitive).
pub fn lookup_mime(mime: &str) -> Option<&'static MimeEntry> {
    MIME_TABLE.iter().find(|e| e.mime.eq_ignore_ascii_case(mime))
}

pub fn family_for_mime(mime: &str) -> Option<TypeFamily> {
    lookup_mime(mime).map(|e| e.family)
}

pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    lookup_mime(mime).map(|e| e.extension)
}

/// All MIME types registered for an extension, aliases included.
pub fn mimes_for_extension(ext: &str) -> Vec<&'static str> {
    let ext = normalize_extension(ext);
    let mut mimes: Vec<&'static str> = MIME_TABLE
        .iter()
        .filter(|e| e.extension == ext)
        .map(|e| e.mime)
        .collect();
    mimes.extend(
        EXTENSION_ALIASES
            .iter()
            .filter(|(alias, _)| *alias == ext)
            .map(|(_, mime)| *mime),
    );
    mimes
}

/// Every extension a MIME type may legitimately carry (canonical first).
pub fn extensions_for_mime(mime: &str) -> Vec<&'static str> {
    let Some(entry) = lookup_mime(mime) else {
        return Vec::new();
    };
    let mut exts = vec![entry.extension];
    exts.extend(
        EXTENSION_ALIASES
            .iter()
            .filter(|(_, m)| m.eq_ignore_ascii_case(entry.mime))
            .map(|(alias, _)| *alias),
    );
    exts
}

pub fn family_for_extension(ext: &str) -> Option<TypeFamily> {
    mimes_for_extension(ext)
        .first()
        .and_then(|mime| family_for_mime(mime))
}

/// Accepted extension set of a family.
pub fn extensions_for_family(family: TypeFamily) -> Vec<&'static str> {
    let mut exts: Vec<&'static str> = MIME_TABLE
        .iter()
        .filter(|e| e.family == family)
        .map(|e| e.extension)
        .collect();
    exts.extend(
        EXTENSION_ALIASES
            .iter()
            .filter(|(_, mime)| family_for_mime(mime) == Some(family))
            .map(|(alias, _)| *alias),
    );
    exts.sort_unstable();
    exts.dedup();
    exts
}

pub fn is_supported_mime(mime: &str) -> bool {
    lookup_mime(mime).is_some()
}

//! Content-based type resolution.
//!
//! Only the first `sniff_bytes` of content are inspected. A signature match
//! yields a group of sibling MIME types that share the same container or
//! encoding; the family of that group is final. The claimed filename's
//! extension can only choose among the siblings.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use triage_core::mime_table;
use triage_core::{ResolutionSource, ResolvedType, ScanError, TypeFamily};

pub const DEFAULT_SNIFF_BYTES: usize = 2048;

/// Members under this prefix are the only images a Word package may carry.
pub const WORD_MEDIA_PREFIX: &str = "word/media/";
const WORD_DOCUMENT_PART: &str = "word/document.xml";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const PACKAGE_PREFIXES: &[&str] = &["_rels/", "docProps/", "customXml/", "word/"];
const WORD_EMBEDDINGS_PREFIX: &str = "word/embeddings/";
const LOCAL_HEADER_LEN: usize = 30;
/// General purpose flag: sizes follow the data instead of the header.
const DATA_DESCRIPTOR_FLAG: u16 = 0x0008;

/// Offset of the `ustar` magic inside a tar header block.
const USTAR_OFFSET: usize = 257;
const TS_PACKET: usize = 188;
const M2TS_PACKET: usize = 192;

// Sibling groups. The first MIME is used unless the claimed extension picks another.
const JPEG: &[&str] = &["image/jpeg"];
const PNG: &[&str] = &["image/png"];
const GIF: &[&str] = &["image/gif"];
const WEBP: &[&str] = &["image/webp"];
const BMP: &[&str] = &["image/bmp"];
const TIFF: &[&str] = &["image/tiff", "image/x-tiff"];
const TGA: &[&str] = &["image/x-tga"];
const PBM: &[&str] = &["image/x-portable-bitmap", "image/x-portable-anymap"];
const PGM: &[&str] = &["image/x-portable-graymap", "image/x-portable-anymap"];
const PPM: &[&str] = &["image/x-portable-pixmap", "image/x-portable-anymap"];
const SVG: &[&str] = &["image/svg+xml"];
const PCX: &[&str] = &["image/x-pcx"];
const PSD: &[&str] = &["image/vnd.adobe.photoshop"];
const ICO: &[&str] = &["image/vnd.microsoft.icon"];
const HEIC: &[&str] = &["image/heic", "image/heif"];
const HEIF: &[&str] = &["image/heif", "image/heic", "image/avif"];
const AVIF: &[&str] = &["image/avif"];
const JXL: &[&str] = &["image/jxl"];

const PDF: &[&str] = &["application/pdf"];
const MSWORD: &[&str] = &["application/msword"];
const DOCX: &[&str] =
    &["application/vnd.openxmlformats-officedocument.wordprocessingml.document"];

const ISO_BMFF: &[&str] = &[
    "video/mp4",
    "video/x-m4v",
    "video/quicktime",
    "video/3gpp",
    "video/3gpp2",
    "video/x-f4v",
];
const QUICKTIME: &[&str] = &["video/quicktime", "video/mp4", "video/x-m4v"];
const M4V: &[&str] = &["video/x-m4v", "video/mp4", "video/quicktime"];
const THREE_GP: &[&str] = &["video/3gpp", "video/3gpp2", "video/mp4"];
const THREE_G2: &[&str] = &["video/3gpp2", "video/3gpp", "video/mp4"];
const F4V: &[&str] = &["video/x-f4v", "video/mp4"];
const AVI: &[&str] = &["video/x-msvideo", "video/divx"];
const MATROSKA: &[&str] = &["video/x-matroska", "video/webm"];
const WEBM: &[&str] = &["video/webm", "video/x-matroska"];
const ASF: &[&str] = &["video/x-ms-wmv", "video/x-ms-asf"];
const FLV: &[&str] = &["video/x-flv"];
const MXF: &[&str] = &["video/mxf"];
const OGM: &[&str] = &["video/x-ogm"];
const REALVIDEO: &[&str] = &["video/vnd.rn-realvideo"];
const DV: &[&str] = &["video/dv"];
const MPEG_PS: &[&str] = &["video/mpeg", "video/x-mpeg", "video/x-vob"];
const MPEG_ES: &[&str] = &["video/x-m2v", "video/mpeg", "video/x-mpeg"];
const MPEG_TS: &[&str] = &["video/MP2T", "video/vnd.dlna.mpeg-tts"];
const M2TS: &[&str] = &["video/vnd.dlna.mpeg-tts", "video/MP2T"];

const ZIP: &[&str] = &["application/zip"];
const RAR: &[&str] = &[
    "application/x-rar-compressed",
    "application/x-rar",
    "application/vnd.rar",
];
const SEVEN_Z: &[&str] = &["application/x-7z-compressed"];
const GZIP: &[&str] = &["application/gzip"];
const TAR: &[&str] = &["application/x-tar"];
const BZIP2: &[&str] = &["application/x-bzip2"];
const XZ: &[&str] = &["application/x-xz"];
const LZMA: &[&str] = &["application/x-lzma"];
const ZSTD: &[&str] = &["application/x-zstd"];
const CAB: &[&str] = &["application/vnd.ms-cab-compressed"];

type Group = &'static [&'static str];

/// Resolves the true type of content from its leading bytes.
#[derive(Debug, Clone, Copy)]
pub struct TypeSniffer {
    sniff_bytes: usize,
}

impl Default for TypeSniffer {
    fn default() -> Self {
        Self::new(DEFAULT_SNIFF_BYTES)
    }
}

impl TypeSniffer {
    pub fn new(sniff_bytes: usize) -> Self {
        Self { sniff_bytes }
    }

    pub fn sniff_bytes(&self) -> usize {
        self.sniff_bytes
    }

    /// Resolve a type from a header slice and the name the client claimed.
    pub fn resolve(&self, header: &[u8], claimed_name: &str) -> Result<ResolvedType, ScanError> {
        if header.is_empty() {
            return Err(ScanError::ReadError("content is empty".to_string()));
        }
        let header = &header[..header.len().min(self.sniff_bytes)];
        let claimed_ext = mime_table::extension_of(claimed_name);

        let group = match_signature(header)
            .or_else(|| match_fallback(header))
            .or_else(|| match_signatureless(header, claimed_ext.as_deref()))
            .ok_or_else(|| {
                ScanError::UnsupportedType(format!(
                    "no known signature matches '{}'",
                    claimed_name
                ))
            })?;

        reconcile(group, claimed_ext.as_deref())
    }

    /// Read the bounded header of a file on disk.
    pub fn read_header(&self, path: &Path) -> Result<Vec<u8>, ScanError> {
        let file = File::open(path)
            .map_err(|e| ScanError::ReadError(format!("cannot open content: {}", e)))?;
        let mut header = Vec::with_capacity(self.sniff_bytes);
        file.take(self.sniff_bytes as u64)
            .read_to_end(&mut header)
            .map_err(|e| ScanError::ReadError(format!("cannot read content: {}", e)))?;
        Ok(header)
    }

    /// Resolve a file on disk. ZIP containers are settled from the central
    /// directory, which sees every member rather than the header window.
    pub fn resolve_path(&self, path: &Path, claimed_name: &str) -> Result<ResolvedType, ScanError> {
        let header = self.read_header(path)?;
        let resolved = self.resolve(&header, claimed_name)?;
        if !is_zip(&header) {
            return Ok(resolved);
        }
        let group = if is_word_package_file(path) { DOCX } else { ZIP };
        if group[0] == resolved.mime {
            return Ok(resolved);
        }
        reconcile(group, mime_table::extension_of(claimed_name).as_deref())
    }
}

/// Pick the concrete MIME inside a sibling group.
fn reconcile(group: Group, claimed_ext: Option<&str>) -> Result<ResolvedType, ScanError> {
    let default_mime = group[0];
    let family = mime_table::family_for_mime(default_mime).ok_or_else(|| {
        ScanError::Internal(format!("signature group '{}' missing from table", default_mime))
    })?;

    if let Some(ext) = claimed_ext {
        let claimed_mimes = mime_table::mimes_for_extension(ext);
        let picked = group
            .iter()
            .find(|m| claimed_mimes.iter().any(|c| c.eq_ignore_ascii_case(m)));
        if let Some(mime) = picked {
            let canonical = mime_table::extension_for_mime(mime).unwrap_or(ext);
            let source = if *mime == default_mime && ext == canonical {
                ResolutionSource::Sniffed
            } else {
                ResolutionSource::ExtensionDisambiguated
            };
            return Ok(ResolvedType::new(family, *mime, ext, source));
        }
    }

    let extension = mime_table::extension_for_mime(default_mime).unwrap_or_default();
    Ok(ResolvedType::new(
        family,
        default_mime,
        extension,
        ResolutionSource::Sniffed,
    ))
}

fn at(h: &[u8], offset: usize, magic: &[u8]) -> bool {
    h.len() >= offset + magic.len() && &h[offset..offset + magic.len()] == magic
}

fn match_signature(h: &[u8]) -> Option<Group> {
    // Images
    if h.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(JPEG);
    }
    if h.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some(PNG);
    }
    if h.starts_with(b"GIF87a") || h.starts_with(b"GIF89a") {
        return Some(GIF);
    }
    if h.starts_with(b"RIFF") && at(h, 8, b"WEBP") {
        return Some(WEBP);
    }
    if h.starts_with(b"II*\x00") || h.starts_with(b"MM\x00*") {
        return Some(TIFF);
    }
    if h.starts_with(b"8BPS") {
        return Some(PSD);
    }
    if h.starts_with(&[0xFF, 0x0A])
        || h.starts_with(&[
            0x00, 0x00, 0x00, 0x0C, b'J', b'X', b'L', b' ', 0x0D, 0x0A, 0x87, 0x0A,
        ])
    {
        return Some(JXL);
    }
    if is_bmp(h) {
        return Some(BMP);
    }
    if h.len() >= 6 && h.starts_with(&[0x00, 0x00, 0x01, 0x00]) && (h[4] != 0 || h[5] != 0) {
        return Some(ICO);
    }
    if let Some(group) = match_pnm(h) {
        return Some(group);
    }
    if h.len() >= 128 && h[0] == 0x0A && h[1] <= 5 && h[2] == 1 {
        return Some(PCX);
    }

    // ISO base media: images and videos share the container
    if at(h, 4, b"ftyp") {
        return Some(match_ftyp_brand(h));
    }
    if at(h, 4, b"moov") || at(h, 4, b"mdat") || at(h, 4, b"wide") {
        return Some(QUICKTIME);
    }

    // Videos
    if h.starts_with(b"RIFF") && at(h, 8, b"AVI ") {
        return Some(AVI);
    }
    if h.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some(if contains(h, b"webm") { WEBM } else { MATROSKA });
    }
    if h.starts_with(&[0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11]) {
        return Some(ASF);
    }
    if h.starts_with(b"FLV\x01") {
        return Some(FLV);
    }
    if h.starts_with(&[0x06, 0x0E, 0x2B, 0x34]) {
        return Some(MXF);
    }
    if h.starts_with(b"OggS") {
        return Some(OGM);
    }
    if h.starts_with(b".RMF") {
        return Some(REALVIDEO);
    }
    if h.starts_with(&[0x00, 0x00, 0x01, 0xBA]) {
        return Some(MPEG_PS);
    }
    if h.starts_with(&[0x00, 0x00, 0x01, 0xB3]) {
        return Some(MPEG_ES);
    }
    if h.starts_with(&[0x1F, 0x07, 0x00]) {
        return Some(DV);
    }

    // Documents
    if h.starts_with(b"%PDF-") {
        return Some(PDF);
    }
    if h.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]) {
        return Some(MSWORD);
    }

    // Archives
    if is_zip(h) {
        return Some(if is_word_package(h) { DOCX } else { ZIP });
    }
    if h.starts_with(&[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C]) {
        return Some(SEVEN_Z);
    }
    if h.starts_with(&[0x1F, 0x8B]) {
        return Some(GZIP);
    }
    if h.starts_with(b"BZh") {
        return Some(BZIP2);
    }
    if h.starts_with(&[0xFD, b'7', b'z', b'X', b'Z', 0x00]) {
        return Some(XZ);
    }
    if h.starts_with(&[0x28, 0xB5, 0x2F, 0xFD]) {
        return Some(ZSTD);
    }
    if h.starts_with(b"MSCF") {
        return Some(CAB);
    }
    if h.starts_with(&[0x5D, 0x00, 0x00]) {
        return Some(LZMA);
    }

    None
}

/// Format-specific checks for content the primary table does not recognize.
fn match_fallback(h: &[u8]) -> Option<Group> {
    if h.starts_with(b"Rar!\x1A\x07") {
        return Some(RAR);
    }
    if is_ustar(h) {
        return Some(TAR);
    }
    if is_packet_stream(h, 0, TS_PACKET) {
        return Some(MPEG_TS);
    }
    if is_packet_stream(h, 4, M2TS_PACKET) {
        return Some(M2TS);
    }
    if is_svg(h) {
        return Some(SVG);
    }
    None
}

/// Formats without a reliable leading signature are only accepted when the
/// claimed extension names them and the header is structurally plausible.
fn match_signatureless(h: &[u8], claimed_ext: Option<&str>) -> Option<Group> {
    match claimed_ext? {
        ".tga" if is_plausible_tga(h) => Some(TGA),
        _ => None,
    }
}

fn match_ftyp_brand(h: &[u8]) -> Group {
    let brand = if h.len() >= 12 { &h[8..12] } else { &[][..] };
    match brand {
        b"avif" | b"avis" => AVIF,
        b"heic" | b"heix" | b"hevc" | b"hevx" | b"heim" | b"heis" => HEIC,
        b"mif1" | b"msf1" => HEIF,
        b"qt  " => QUICKTIME,
        b"M4V " | b"M4VH" | b"M4VP" => M4V,
        b"F4V " | b"F4P " => F4V,
        b if b.starts_with(b"3g2") => THREE_G2,
        b if b.starts_with(b"3gp") => THREE_GP,
        _ => ISO_BMFF,
    }
}

fn match_pnm(h: &[u8]) -> Option<Group> {
    if h.len() < 3 || h[0] != b'P' || !h[2].is_ascii_whitespace() {
        return None;
    }
    match h[1] {
        b'1' | b'4' => Some(PBM),
        b'2' | b'5' => Some(PGM),
        b'3' | b'6' => Some(PPM),
        _ => None,
    }
}

fn is_bmp(h: &[u8]) -> bool {
    if h.len() < 18 || !h.starts_with(b"BM") {
        return false;
    }
    let dib_size = u32::from_le_bytes([h[14], h[15], h[16], h[17]]);
    matches!(dib_size, 12 | 40 | 52 | 56 | 64 | 108 | 124)
}

pub(crate) fn is_ustar(h: &[u8]) -> bool {
    at(h, USTAR_OFFSET, b"ustar")
}

fn is_packet_stream(h: &[u8], offset: usize, packet: usize) -> bool {
    (0..3).all(|i| h.get(offset + i * packet) == Some(&0x47))
}

fn is_zip(h: &[u8]) -> bool {
    h.starts_with(b"PK\x03\x04") || h.starts_with(b"PK\x05\x06")
}

/// Header-only guess: some local file header in the window names the main
/// document part exactly.
fn is_word_package(h: &[u8]) -> bool {
    local_member_names(h)
        .iter()
        .any(|name| *name == WORD_DOCUMENT_PART.as_bytes())
}

/// Names of the local file headers that fit inside the window, in order.
fn local_member_names(h: &[u8]) -> Vec<&[u8]> {
    let mut names = Vec::new();
    let mut offset = 0usize;
    while at(h, offset, b"PK\x03\x04") && h.len() >= offset + LOCAL_HEADER_LEN {
        let flags = read_u16(h, offset + 6);
        let compressed = read_u32(h, offset + 18) as usize;
        let name_len = read_u16(h, offset + 26) as usize;
        let extra_len = read_u16(h, offset + 28) as usize;
        let name_start = offset + LOCAL_HEADER_LEN;
        let Some(name) = h.get(name_start..name_start + name_len) else {
            break;
        };
        names.push(name);
        if flags & DATA_DESCRIPTOR_FLAG != 0 {
            break;
        }
        offset = name_start + name_len + extra_len + compressed;
    }
    names
}

fn read_u16(h: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([h[offset], h[offset + 1]])
}

fn read_u32(h: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([h[offset], h[offset + 1], h[offset + 2], h[offset + 3]])
}

/// A ZIP is a Word package only when it holds the main document part and
/// nothing outside the package layout. Anything else gets expanded.
fn is_word_package_file(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let Ok(archive) = zip::ZipArchive::new(file) else {
        return false;
    };
    let mut has_document = false;
    for name in archive.file_names() {
        if name == WORD_DOCUMENT_PART {
            has_document = true;
        } else if !is_package_part(name) {
            tracing::debug!(member = name, "Zip member outside the Word package layout");
            return false;
        }
    }
    has_document
}

fn is_package_part(name: &str) -> bool {
    if name == CONTENT_TYPES_PART {
        return true;
    }
    if !PACKAGE_PREFIXES.iter().any(|p| name.starts_with(p))
        || name.starts_with(WORD_EMBEDDINGS_PREFIX)
    {
        return false;
    }
    match mime_table::extension_of(name).and_then(|ext| mime_table::family_for_extension(&ext)) {
        None => true,
        Some(TypeFamily::Image) => name.starts_with(WORD_MEDIA_PREFIX),
        Some(_) => false,
    }
}

fn is_svg(h: &[u8]) -> bool {
    let text = h.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(h);
    let Ok(text) = std::str::from_utf8(trim_partial_utf8(text)) else {
        return false;
    };
    let lower = text.trim_start().to_ascii_lowercase();
    (lower.starts_with("<?xml") || lower.starts_with("<svg") || lower.starts_with("<!doctype svg"))
        && lower.contains("<svg")
}

/// Header windows can cut a multi-byte character in half.
fn trim_partial_utf8(bytes: &[u8]) -> &[u8] {
    match std::str::from_utf8(bytes) {
        Ok(_) => bytes,
        Err(e) if e.error_len().is_none() => &bytes[..e.valid_up_to()],
        Err(_) => bytes,
    }
}

fn is_plausible_tga(h: &[u8]) -> bool {
    h.len() >= 18 && h[1] <= 1 && matches!(h[2], 1 | 2 | 3 | 9 | 10 | 11)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use triage_core::{ErrorKind, ErrorMetadata, TypeFamily};

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    fn ftyp(brand: &[u8; 4]) -> Vec<u8> {
        let mut h = vec![0x00, 0x00, 0x00, 0x20];
        h.extend_from_slice(b"ftyp");
        h.extend_from_slice(brand);
        h.extend_from_slice(&[0u8; 20]);
        h
    }

    #[test]
    fn sniffed_family_governs_mismatched_extension() {
        let sniffer = TypeSniffer::default();
        let resolved = sniffer.resolve(PNG_HEADER, "holiday.mp4").unwrap();
        assert_eq!(resolved.family, TypeFamily::Image);
        assert_eq!(resolved.mime, "image/png");
        assert_eq!(resolved.extension, ".png");
        assert_eq!(resolved.source, ResolutionSource::Sniffed);
    }

    #[test]
    fn every_foreign_extension_keeps_the_sniffed_family() {
        let sniffer = TypeSniffer::default();
        let image_exts = mime_table::extensions_for_family(TypeFamily::Image);
        for entry in mime_table::MIME_TABLE {
            if image_exts.contains(&entry.extension) {
                continue;
            }
            let name = format!("file{}", entry.extension);
            let resolved = sniffer.resolve(JPEG_HEADER, &name).unwrap();
            assert_eq!(resolved.family, TypeFamily::Image, "claimed {}", name);
            assert_eq!(resolved.mime, "image/jpeg");
        }
    }

    #[test]
    fn extension_picks_sibling_within_group() {
        let sniffer = TypeSniffer::default();

        let jpeg = sniffer.resolve(JPEG_HEADER, "photo.JPEG").unwrap();
        assert_eq!(jpeg.extension, ".jpeg");
        assert_eq!(jpeg.source, ResolutionSource::ExtensionDisambiguated);

        let m4v = sniffer.resolve(&ftyp(b"isom"), "clip.m4v").unwrap();
        assert_eq!(m4v.mime, "video/x-m4v");
        assert_eq!(m4v.source, ResolutionSource::ExtensionDisambiguated);

        let mp4 = sniffer.resolve(&ftyp(b"isom"), "clip.mp4").unwrap();
        assert_eq!(mp4.mime, "video/mp4");
        assert_eq!(mp4.source, ResolutionSource::Sniffed);

        let ps = [0x00, 0x00, 0x01, 0xBA, 0x44, 0x00];
        let vob = sniffer.resolve(&ps, "VTS_01_1.VOB").unwrap();
        assert_eq!(vob.mime, "video/x-vob");
        assert_eq!(vob.extension, ".vob");
    }

    #[test]
    fn heif_brands_resolve_to_images() {
        let sniffer = TypeSniffer::default();
        let heic = sniffer.resolve(&ftyp(b"heic"), "IMG_0001.heic").unwrap();
        assert_eq!(heic.family, TypeFamily::Image);
        assert_eq!(heic.mime, "image/heic");

        let avif = sniffer.resolve(&ftyp(b"avif"), "x.mp4").unwrap();
        assert_eq!(avif.mime, "image/avif");
    }

    #[test]
    fn fallback_detects_ustar_at_offset_257() {
        let mut header = vec![0u8; 512];
        header[..9].copy_from_slice(b"photo.jpg");
        header[257..262].copy_from_slice(b"ustar");
        let resolved = TypeSniffer::default().resolve(&header, "bundle").unwrap();
        assert_eq!(resolved.mime, "application/x-tar");
        assert!(resolved.is_archive());
    }

    #[test]
    fn fallback_detects_transport_stream_sync() {
        let mut header = vec![0u8; 600];
        for i in 0..3 {
            header[i * TS_PACKET] = 0x47;
        }
        let resolved = TypeSniffer::default().resolve(&header, "rec.bin").unwrap();
        assert_eq!(resolved.mime, "video/MP2T");
        assert_eq!(resolved.family, TypeFamily::Video);
    }

    fn local_header(name: &str, data: &[u8]) -> Vec<u8> {
        let mut h = b"PK\x03\x04".to_vec();
        h.extend_from_slice(&[0u8; 14]);
        h.extend_from_slice(&(data.len() as u32).to_le_bytes());
        h.extend_from_slice(&(data.len() as u32).to_le_bytes());
        h.extend_from_slice(&(name.len() as u16).to_le_bytes());
        h.extend_from_slice(&0u16.to_le_bytes());
        h.extend_from_slice(name.as_bytes());
        h.extend_from_slice(data);
        h
    }

    fn zip_file(members: &[(&str, &[u8])]) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut writer = zip::ZipWriter::new(file.reopen().unwrap());
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, data) in members {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
        file
    }

    #[test]
    fn word_package_inside_zip_is_a_document() {
        let mut header = local_header("[Content_Types].xml", b"<Types/>");
        header.extend(local_header("word/document.xml", b"<w:document/>"));
        let resolved = TypeSniffer::default().resolve(&header, "report.zip").unwrap();
        assert_eq!(resolved.family, TypeFamily::Document);
        assert_eq!(resolved.extension, ".docx");
    }

    #[test]
    fn word_like_member_names_stay_a_zip() {
        let mut header = local_header("password/notes.txt", b"hunter2");
        header.extend(local_header("keyword/document.xml.bak", b"x"));
        header.extend(local_header("nude.png", PNG_HEADER));
        let resolved = TypeSniffer::default().resolve(&header, "bundle.zip").unwrap();
        assert_eq!(resolved.mime, "application/zip");
        assert_eq!(resolved.family, TypeFamily::Archive);
    }

    #[test]
    fn central_directory_decides_word_packages() {
        let docx = zip_file(&[
            ("[Content_Types].xml", b"<Types/>"),
            ("_rels/.rels", b"<Relationships/>"),
            ("word/document.xml", b"<w:document/>"),
            ("word/media/image1.png", PNG_HEADER),
        ]);
        let resolved = TypeSniffer::default().resolve_path(docx.path(), "a.zip").unwrap();
        assert_eq!(resolved.family, TypeFamily::Document);

        let plain = zip_file(&[("password/notes.txt", b"hunter2"), ("nude.png", PNG_HEADER)]);
        let resolved = TypeSniffer::default().resolve_path(plain.path(), "a.docx").unwrap();
        assert_eq!(resolved.mime, "application/zip");
    }

    #[test]
    fn word_package_with_foreign_members_is_a_zip() {
        for stray in ["nude.png", "word/theme/nude.png", "word/embeddings/inner.zip", "docProps/clip.mp4"] {
            let file = zip_file(&[
                ("[Content_Types].xml", b"<Types/>"),
                ("word/document.xml", b"<w:document/>"),
                (stray, PNG_HEADER),
            ]);
            let resolved = TypeSniffer::default().resolve_path(file.path(), "a.docx").unwrap();
            assert_eq!(resolved.mime, "application/zip", "{} hid inside a document", stray);
        }
    }

    #[test]
    fn raw_yuv_claim_is_not_trusted() {
        let err = TypeSniffer::default()
            .resolve(b"plain text", "x.yuv")
            .unwrap_err();
        assert_eq!(err.error_kind(), ErrorKind::UnsupportedType);
    }

    #[test]
    fn plain_zip_is_an_archive() {
        let mut header = b"PK\x03\x04".to_vec();
        header.extend_from_slice(&[0u8; 26]);
        header.extend_from_slice(b"photos/cat.png");
        let resolved = TypeSniffer::default().resolve(&header, "x.docx").unwrap();
        assert_eq!(resolved.mime, "application/zip");
    }

    #[test]
    fn svg_text_is_sniffed() {
        let header = b"\xEF\xBB\xBF  <?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"/>";
        let resolved = TypeSniffer::default().resolve(header, "icon").unwrap();
        assert_eq!(resolved.mime, "image/svg+xml");
    }

    #[test]
    fn rar_variants_share_a_group() {
        let header = b"Rar!\x1A\x07\x01\x00";
        let resolved = TypeSniffer::default().resolve(header, "a.rar").unwrap();
        assert_eq!(resolved.mime, "application/x-rar-compressed");
        assert_eq!(resolved.family, TypeFamily::Archive);
    }

    #[test]
    fn tga_needs_both_extension_and_plausible_header() {
        let mut header = vec![0u8; 18];
        header[2] = 2;
        let sniffer = TypeSniffer::default();
        assert_eq!(sniffer.resolve(&header, "sprite.tga").unwrap().mime, "image/x-tga");
        assert!(sniffer.resolve(&header, "sprite.bin").is_err());
    }

    #[test]
    fn unknown_content_is_unsupported() {
        let err = TypeSniffer::default()
            .resolve(b"just some notes", "notes.jpg")
            .unwrap_err();
        assert_eq!(err.error_kind(), ErrorKind::UnsupportedType);
    }

    #[test]
    fn empty_content_is_a_read_error() {
        let err = TypeSniffer::default().resolve(b"", "x.png").unwrap_err();
        assert_eq!(err.error_kind(), ErrorKind::ReadError);
    }

    #[test]
    fn header_window_is_bounded() {
        let mut header = vec![b'a'; 600];
        header[257..262].copy_from_slice(b"ustar");
        // ustar magic lies past a 256-byte window
        assert!(TypeSniffer::new(256).resolve(&header, "x").is_err());
        assert!(TypeSniffer::new(512).resolve(&header, "x").is_ok());
    }

    #[test]
    fn resolve_path_reads_only_the_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PNG_HEADER).unwrap();
        file.write_all(&vec![0u8; 10_000]).unwrap();
        let sniffer = TypeSniffer::new(64);
        assert_eq!(sniffer.read_header(file.path()).unwrap().len(), 64);
        let resolved = sniffer.resolve_path(file.path(), "upload").unwrap();
        assert_eq!(resolved.mime, "image/png");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = TypeSniffer::default()
            .resolve_path(Path::new("/nonexistent/triage/x.png"), "x.png")
            .unwrap_err();
        assert_eq!(err.error_kind(), ErrorKind::ReadError);
    }

    #[test]
    fn every_group_is_in_the_table() {
        for group in [
            JPEG, PNG, GIF, WEBP, BMP, TIFF, TGA, PBM, PGM, PPM, SVG, PCX, PSD, ICO, HEIC, HEIF,
            AVIF, JXL, PDF, MSWORD, DOCX, ISO_BMFF, QUICKTIME, M4V, THREE_GP, THREE_G2, F4V, AVI,
            MATROSKA, WEBM, ASF, FLV, MXF, OGM, REALVIDEO, DV, MPEG_PS, MPEG_ES, MPEG_TS, M2TS,
            ZIP, RAR, SEVEN_Z, GZIP, TAR, BZIP2, XZ, LZMA, ZSTD, CAB,
        ] {
            for mime in group {
                assert!(mime_table::is_supported_mime(mime), "{} missing", mime);
            }
        }
    }
}

//! Recursive archive expansion.
//!
//! ZIP, TAR, single-member GZIP and gzip-compressed TAR are expanded. Other
//! archive types in the MIME table are recognized but listed, not opened.

mod expander;
mod formats;
pub mod path;

pub use expander::ArchiveExpander;

use triage_core::TriageConfig;

/// Container formats the expander can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    Zip,
    Tar,
    /// Single gzip member; a tar stream inside is detected while reading.
    Gzip,
}

impl ArchiveKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "application/zip" => Some(ArchiveKind::Zip),
            "application/x-tar" => Some(ArchiveKind::Tar),
            "application/gzip" => Some(ArchiveKind::Gzip),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveKind::Zip => "zip",
            ArchiveKind::Tar => "tar",
            ArchiveKind::Gzip => "gzip",
        }
    }
}

/// Bounds applied to one request's expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionLimits {
    /// The root archive is depth 1.
    pub max_depth: u32,
    pub max_extracted_bytes: u64,
    pub max_entries: usize,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        Self::from_config(&TriageConfig::default())
    }
}

impl ExpansionLimits {
    pub fn from_config(config: &TriageConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_extracted_bytes: config.max_extracted_bytes,
            max_entries: config.max_archive_entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_expandable_formats_have_a_kind() {
        assert_eq!(ArchiveKind::from_mime("application/zip"), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::from_mime("Application/GZIP"), Some(ArchiveKind::Gzip));
        assert_eq!(ArchiveKind::from_mime("application/x-tar"), Some(ArchiveKind::Tar));
        assert_eq!(ArchiveKind::from_mime("application/vnd.rar"), None);
        assert_eq!(ArchiveKind::from_mime("application/x-7z-compressed"), None);
    }

    #[test]
    fn default_limits_follow_config_defaults() {
        let limits = ExpansionLimits::default();
        assert_eq!(limits.max_depth, 3);
        assert_eq!(limits.max_entries, 10_000);
    }
}

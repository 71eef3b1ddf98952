use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of type families. Analyzer selection is keyed by this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFamily {
    Image,
    Video,
    Document,
    Archive,
}

impl TypeFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeFamily::Image => "image",
            TypeFamily::Video => "video",
            TypeFamily::Document => "document",
            TypeFamily::Archive => "archive",
        }
    }
}

impl fmt::Display for TypeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the concrete sub-type was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Content signature alone decided the type.
    Sniffed,
    /// Content decided the family; the claimed extension picked the sub-type.
    ExtensionDisambiguated,
}

/// A file's true type, resolved from content bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedType {
    #[serde(rename = "mimeFamily")]
    pub family: TypeFamily,
    pub mime: String,
    pub extension: String,
    pub source: ResolutionSource,
}

impl ResolvedType {
    pub fn new(
        family: TypeFamily,
        mime: impl Into<String>,
        extension: impl Into<String>,
        source: ResolutionSource,
    ) -> Self {
        Self {
            family,
            mime: mime.into(),
            extension: extension.into(),
            source,
        }
    }

    pub fn is_archive(&self) -> bool {
        self.family == TypeFamily::Archive
    }
}

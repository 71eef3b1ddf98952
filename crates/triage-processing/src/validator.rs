use std::io;
use std::path::{Path, PathBuf};

use subtle::ConstantTimeEq;
use triage_core::{mime_table, ScanError, TriageConfig};

/// Intake validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Empty file")]
    EmptyFile,

    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Missing authentication token")]
    MissingToken,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Not a regular file: {0}")]
    NotAFile(String),

    #[error("Access to path denied: {0}")]
    DeniedPath(String),

    #[error("Cannot read path {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

impl From<ValidationError> for ScanError {
    fn from(err: ValidationError) -> Self {
        let message = err.to_string();
        match err {
            ValidationError::FileTooLarge { size, max } => ScanError::SizeExceeded { size, max },
            ValidationError::EmptyFile | ValidationError::Unreadable { .. } => {
                ScanError::ReadError(message)
            }
            ValidationError::InvalidContentType(_) => ScanError::UnsupportedType(message),
            ValidationError::MissingToken | ValidationError::InvalidToken => {
                ScanError::Unauthorized(message)
            }
            ValidationError::NotFound(_) => ScanError::NotFound(message),
            ValidationError::InvalidFilename(_)
            | ValidationError::NotAFile(_)
            | ValidationError::DeniedPath(_) => ScanError::InvalidRequest(message),
        }
    }
}

/// Checks applied at intake, before any content is read.
#[derive(Debug, Clone)]
pub struct IntakeValidator {
    max_file_size: u64,
    require_token: bool,
    allowed_tokens: Vec<String>,
    denied_prefixes: Vec<PathBuf>,
}

impl IntakeValidator {
    pub fn new(
        max_file_size: u64,
        require_token: bool,
        allowed_tokens: Vec<String>,
        denied_prefixes: Vec<PathBuf>,
    ) -> Self {
        // Compare against canonical prefixes so symlinked roots still match.
        let denied_prefixes = denied_prefixes
            .into_iter()
            .map(|p| p.canonicalize().unwrap_or(p))
            .collect();
        Self {
            max_file_size,
            require_token,
            allowed_tokens,
            denied_prefixes,
        }
    }

    pub fn from_config(config: &TriageConfig) -> Self {
        Self::new(
            config.max_file_size_bytes,
            config.require_auth_token,
            config.auth_tokens.clone(),
            config.denied_path_prefixes.clone(),
        )
    }

    /// Validate the caller's token. With no allow-list any non-blank token passes.
    pub fn validate_token(&self, token: Option<&str>) -> Result<(), ValidationError> {
        if !self.require_token {
            return Ok(());
        }

        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingToken)?;

        if self.allowed_tokens.is_empty() {
            return Ok(());
        }

        let matched = self
            .allowed_tokens
            .iter()
            .fold(false, |found, allowed| found | secure_compare(token, allowed));
        if !matched {
            return Err(ValidationError::InvalidToken);
        }
        Ok(())
    }

    /// Validate file size against the configured cap, narrowed by the
    /// request's own budget when it sets a smaller one.
    pub fn validate_file_size(&self, size: u64, requested: Option<u64>) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        let max = requested.map_or(self.max_file_size, |r| r.min(self.max_file_size));
        if size > max {
            return Err(ValidationError::FileTooLarge { size, max });
        }

        Ok(())
    }

    /// A declared content type, when present, must be one the pipeline accepts.
    pub fn validate_content_type(&self, content_type: Option<&str>) -> Result<(), ValidationError> {
        let Some(content_type) = content_type else {
            return Ok(());
        };
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();

        if !mime_table::is_supported_mime(essence) {
            return Err(ValidationError::InvalidContentType(content_type.to_string()));
        }
        Ok(())
    }

    pub fn validate_claimed_name(&self, name: &str) -> Result<(), ValidationError> {
        if name.trim().is_empty() || name.contains('\0') {
            return Err(ValidationError::InvalidFilename(name.escape_debug().to_string()));
        }
        Ok(())
    }

    /// Resolve a referenced path and check that it may be scanned.
    ///
    /// Returns the canonical path and the file size.
    pub fn validate_path(&self, path: &Path) -> Result<(PathBuf, u64), ValidationError> {
        let display = path.display().to_string();
        let canonical = path.canonicalize().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ValidationError::NotFound(display.clone()),
            _ => ValidationError::Unreadable {
                path: display.clone(),
                reason: e.to_string(),
            },
        })?;

        if let Some(prefix) = self
            .denied_prefixes
            .iter()
            .find(|prefix| canonical.starts_with(prefix))
        {
            tracing::warn!(
                path = %canonical.display(),
                prefix = %prefix.display(),
                "Rejected path under denied prefix"
            );
            return Err(ValidationError::DeniedPath(display));
        }

        let metadata = canonical.metadata().map_err(|e| ValidationError::Unreadable {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        if !metadata.is_file() {
            return Err(ValidationError::NotAFile(display));
        }

        Ok((canonical, metadata.len()))
    }
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

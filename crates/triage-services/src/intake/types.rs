use bytes::Bytes;
use std::path::PathBuf;

/// Where the request content comes from.
#[derive(Debug, Clone)]
pub enum ScanInput {
    /// A file already on local disk.
    Path(PathBuf),
    /// Uploaded bytes, copied into a guard-owned temp file before sniffing.
    Upload {
        data: Bytes,
        content_type: Option<String>,
    },
}

/// One request as handed to [`crate::ScanService::scan`].
#[derive(Debug, Clone)]
pub struct IntakeRequest {
    pub input: ScanInput,
    /// Name the caller gave the content. Defaults to the file name for path input.
    pub claimed_name: Option<String>,
    pub token: Option<String>,
    /// Caller's size budget. Never raises the configured maximum.
    pub max_size_bytes: Option<u64>,
}

impl IntakeRequest {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self {
            input: ScanInput::Path(path.into()),
            claimed_name: None,
            token: None,
            max_size_bytes: None,
        }
    }

    pub fn upload(data: impl Into<Bytes>, claimed_name: impl Into<String>) -> Self {
        Self {
            input: ScanInput::Upload {
                data: data.into(),
                content_type: None,
            },
            claimed_name: Some(claimed_name.into()),
            token: None,
            max_size_bytes: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.claimed_name = Some(name.into());
        self
    }

    pub fn with_max_size(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = Some(max_size_bytes);
        self
    }

    /// Declared content type of an upload; ignored for path input.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        if let ScanInput::Upload {
            content_type: declared,
            ..
        } = &mut self.input
        {
            *declared = Some(content_type.into());
        }
        self
    }
}

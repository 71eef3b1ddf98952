use triage_core::ScanError;

/// Failure inside a single analyzer run.
///
/// Every variant surfaces to callers as `analyzer_error`; the variant only
/// sharpens the message and the log line.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Failed to decode content: {0}")]
    Decode(String),

    #[error("Classifier failed: {0}")]
    Classifier(String),

    #[error("{tool} failed: {message}")]
    Tool { tool: &'static str, message: String },

    #[error("{0} timed out")]
    Timeout(String),

    #[error("Analyzer does not accept {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalyzerError {
    pub fn tool(tool: &'static str, message: impl Into<String>) -> Self {
        AnalyzerError::Tool {
            tool,
            message: message.into(),
        }
    }
}

impl From<image::ImageError> for AnalyzerError {
    fn from(err: image::ImageError) -> Self {
        AnalyzerError::Decode(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AnalyzerError {
    fn from(err: tokio::task::JoinError) -> Self {
        AnalyzerError::Classifier(format!("analysis task failed: {}", err))
    }
}

impl From<ScanError> for AnalyzerError {
    fn from(err: ScanError) -> Self {
        AnalyzerError::Classifier(err.to_string())
    }
}

impl From<AnalyzerError> for ScanError {
    fn from(err: AnalyzerError) -> Self {
        ScanError::Analyzer(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::{ErrorKind, ErrorMetadata};

    #[test]
    fn every_variant_maps_to_analyzer_error() {
        let errors = vec![
            AnalyzerError::Decode("bad header".into()),
            AnalyzerError::tool("ffmpeg", "exit status 1"),
            AnalyzerError::Timeout("frame sampling".into()),
            AnalyzerError::Io(std::io::Error::other("disk")),
        ];
        for err in errors {
            let scan: ScanError = err.into();
            assert_eq!(scan.error_kind(), ErrorKind::AnalyzerError);
        }
    }

    #[test]
    fn tool_message_names_the_tool() {
        let err = AnalyzerError::tool("ffprobe", "no duration");
        assert_eq!(err.to_string(), "ffprobe failed: no duration");
    }
}

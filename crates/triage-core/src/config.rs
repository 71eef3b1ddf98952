//! Configuration module
//!
//! Settings for intake limits, archive expansion, analysis budgets and the
//! label alias table. Every key is read from a `TRIAGE_`-prefixed environment
//! variable (a `.env` file is honoured) and falls back to a documented default.
//! A key that is set but malformed is an error, never a silent default.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const ENV_PREFIX: &str = "TRIAGE_";

const MAX_FILE_SIZE_MB: u64 = 10;
const MAX_DEPTH: u32 = 3;
const MAX_EXTRACTED_MB: u64 = 512;
const MAX_ARCHIVE_ENTRIES: usize = 10_000;
const SNIFF_BYTES: usize = 2048;
const NSFW_THRESHOLD: f64 = 0.8;
const REQUEST_TIMEOUT_SECS: u64 = 300;
const FFMPEG_MAX_FRAMES: u32 = 20;
const FFMPEG_TIMEOUT_SECS: u64 = 1800;
const MAX_INTERVAL_SECONDS: u64 = 30;
const ANALYZER_RESET_THRESHOLD: u64 = 10_000;
const CLASSIFIER_TIMEOUT_SECS: u64 = 30;
const PRIMARY_LABELS: &str = "nsfw,porn,hentai,sexy,explicit";
const BENIGN_LABELS: &str = "normal,neutral,safe,sfw,drawings";

const MB: u64 = 1024 * 1024;

/// Pipeline configuration
#[derive(Clone, Debug)]
pub struct TriageConfig {
    pub environment: String,
    // Intake
    pub max_file_size_bytes: u64,
    pub sniff_bytes: usize,
    pub require_auth_token: bool,
    /// Accepted tokens. Empty means any non-blank token is accepted.
    pub auth_tokens: Vec<String>,
    pub denied_path_prefixes: Vec<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    // Archive expansion
    pub max_depth: u32,
    pub max_extracted_bytes: u64,
    pub max_archive_entries: usize,
    // Analysis
    pub nsfw_threshold: f64,
    pub check_all_files: bool,
    pub request_timeout: Duration,
    pub primary_labels: Vec<String>,
    pub benign_labels: Vec<String>,
    pub analyzer_reset_threshold: u64,
    // Video sampling
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub ffmpeg_max_frames: u32,
    pub ffmpeg_timeout: Duration,
    pub max_interval_seconds: u64,
    // Classifier endpoint
    pub classifier_url: Option<String>,
    pub classifier_api_key: Option<String>,
    pub classifier_timeout: Duration,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            max_file_size_bytes: MAX_FILE_SIZE_MB * MB,
            sniff_bytes: SNIFF_BYTES,
            require_auth_token: true,
            auth_tokens: Vec::new(),
            denied_path_prefixes: Vec::new(),
            temp_dir: None,
            max_depth: MAX_DEPTH,
            max_extracted_bytes: MAX_EXTRACTED_MB * MB,
            max_archive_entries: MAX_ARCHIVE_ENTRIES,
            nsfw_threshold: NSFW_THRESHOLD,
            check_all_files: false,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            primary_labels: split_list(PRIMARY_LABELS),
            benign_labels: split_list(BENIGN_LABELS),
            analyzer_reset_threshold: ANALYZER_RESET_THRESHOLD,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_max_frames: FFMPEG_MAX_FRAMES,
            ffmpeg_timeout: Duration::from_secs(FFMPEG_TIMEOUT_SECS),
            max_interval_seconds: MAX_INTERVAL_SECONDS,
            classifier_url: None,
            classifier_api_key: None,
            classifier_timeout: Duration::from_secs(CLASSIFIER_TIMEOUT_SECS),
        }
    }
}

/// Parse a key when it is set, otherwise take the default.
fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T, anyhow::Error> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{ENV_PREFIX}{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

fn megabytes(mb: u64, key: &str) -> Result<u64, anyhow::Error> {
    mb.checked_mul(MB)
        .ok_or_else(|| anyhow::anyhow!("{ENV_PREFIX}{key} is too large"))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl TriageConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Build from an arbitrary key source. Keys are given without the prefix.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_file_size_mb = parse_or(get("MAX_FILE_SIZE_MB"), "MAX_FILE_SIZE_MB", MAX_FILE_SIZE_MB)?;
        let max_extracted_mb = parse_or(get("MAX_EXTRACTED_MB"), "MAX_EXTRACTED_MB", MAX_EXTRACTED_MB)?;

        let config = Self {
            environment: get("ENVIRONMENT").unwrap_or(defaults.environment),
            max_file_size_bytes: megabytes(max_file_size_mb, "MAX_FILE_SIZE_MB")?,
            sniff_bytes: parse_or(get("SNIFF_BYTES"), "SNIFF_BYTES", SNIFF_BYTES)?,
            require_auth_token: parse_or(get("REQUIRE_AUTH_TOKEN"), "REQUIRE_AUTH_TOKEN", true)?,
            auth_tokens: get("AUTH_TOKENS")
                .map(|s| {
                    s.split(',')
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            denied_path_prefixes: get("DENIED_PATH_PREFIXES")
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(PathBuf::from)
                        .collect()
                })
                .unwrap_or_default(),
            temp_dir: get("TEMP_DIR").map(PathBuf::from),
            max_depth: parse_or(get("MAX_DEPTH"), "MAX_DEPTH", MAX_DEPTH)?,
            max_extracted_bytes: megabytes(max_extracted_mb, "MAX_EXTRACTED_MB")?,
            max_archive_entries: parse_or(
                get("MAX_ARCHIVE_ENTRIES"),
                "MAX_ARCHIVE_ENTRIES",
                MAX_ARCHIVE_ENTRIES,
            )?,
            nsfw_threshold: parse_or(get("NSFW_THRESHOLD"), "NSFW_THRESHOLD", NSFW_THRESHOLD)?,
            check_all_files: parse_or(get("CHECK_ALL_FILES"), "CHECK_ALL_FILES", false)?,
            request_timeout: Duration::from_secs(parse_or(
                get("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                REQUEST_TIMEOUT_SECS,
            )?),
            primary_labels: get("PRIMARY_LABELS")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.primary_labels),
            benign_labels: get("BENIGN_LABELS")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.benign_labels),
            analyzer_reset_threshold: parse_or(
                get("ANALYZER_RESET_THRESHOLD"),
                "ANALYZER_RESET_THRESHOLD",
                ANALYZER_RESET_THRESHOLD,
            )?,
            ffmpeg_path: get("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            ffprobe_path: get("FFPROBE_PATH").unwrap_or(defaults.ffprobe_path),
            ffmpeg_max_frames: parse_or(
                get("FFMPEG_MAX_FRAMES"),
                "FFMPEG_MAX_FRAMES",
                FFMPEG_MAX_FRAMES,
            )?,
            ffmpeg_timeout: Duration::from_secs(parse_or(
                get("FFMPEG_TIMEOUT_SECS"),
                "FFMPEG_TIMEOUT_SECS",
                FFMPEG_TIMEOUT_SECS,
            )?),
            max_interval_seconds: parse_or(
                get("MAX_INTERVAL_SECONDS"),
                "MAX_INTERVAL_SECONDS",
                MAX_INTERVAL_SECONDS,
            )?,
            classifier_url: get("CLASSIFIER_URL"),
            classifier_api_key: get("CLASSIFIER_API_KEY"),
            classifier_timeout: Duration::from_secs(parse_or(
                get("CLASSIFIER_TIMEOUT_SECS"),
                "CLASSIFIER_TIMEOUT_SECS",
                CLASSIFIER_TIMEOUT_SECS,
            )?),
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("TRIAGE_MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.max_depth == 0 {
            return Err(anyhow::anyhow!("TRIAGE_MAX_DEPTH must be at least 1"));
        }

        if self.sniff_bytes < 512 {
            // ustar magic sits at offset 257 and must fit in the header window.
            return Err(anyhow::anyhow!("TRIAGE_SNIFF_BYTES must be at least 512"));
        }

        if !(0.0..=1.0).contains(&self.nsfw_threshold) {
            return Err(anyhow::anyhow!(
                "TRIAGE_NSFW_THRESHOLD must be between 0.0 and 1.0"
            ));
        }

        if self.primary_labels.is_empty() {
            return Err(anyhow::anyhow!("TRIAGE_PRIMARY_LABELS must not be empty"));
        }

        if self
            .primary_labels
            .iter()
            .any(|label| self.benign_labels.contains(label))
        {
            return Err(anyhow::anyhow!(
                "A label cannot be both primary and benign"
            ));
        }

        if self.ffmpeg_max_frames == 0 {
            return Err(anyhow::anyhow!("TRIAGE_FFMPEG_MAX_FRAMES must be at least 1"));
        }

        if self.analyzer_reset_threshold == 0 {
            return Err(anyhow::anyhow!(
                "TRIAGE_ANALYZER_RESET_THRESHOLD must be at least 1"
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(anyhow::anyhow!("TRIAGE_REQUEST_TIMEOUT_SECS must be at least 1"));
        }

        if let Some(url) = &self.classifier_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow::anyhow!(
                    "TRIAGE_CLASSIFIER_URL must be an http(s) URL"
                ));
            }
        }

        if self.is_production() && self.require_auth_token && self.auth_tokens.is_empty() {
            return Err(anyhow::anyhow!(
                "TRIAGE_AUTH_TOKENS must be set in production"
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

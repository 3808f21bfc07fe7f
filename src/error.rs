use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrabberError {
    #[error("{0}")]
    VideoNotFound(String),

    #[error("{0}")]
    TranscriptNotFound(String),

    #[error("Browser automation failed: {0}")]
    Browser(String),

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Navigation timeout after {0}ms")]
    NavigationTimeout(u64),

    #[error("Timed out after {timeout_ms}ms waiting for: {target}")]
    WaitTimeout { target: String, timeout_ms: u64 },

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("JavaScript evaluation failed: {0}")]
    EvaluationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid video id or URL: {0}")]
    InvalidVideoId(String),

    #[error("Interrupted")]
    Interrupted,

    #[error("{failed} of {total} videos failed")]
    BatchIncomplete { failed: usize, total: usize },

    #[error("{failed} output files could not be written")]
    SaveIncomplete { failed: usize },

    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error("General error: {0}")]
    General(String),
}

/// Terminal classification of a failed extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    VideoNotFound,
    TranscriptNotFound,
    BrowserError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VideoNotFound => "video_not_found",
            Self::TranscriptNotFound => "transcript_not_found",
            Self::BrowserError => "browser_error",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GrabberError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::VideoNotFound(_) => FailureKind::VideoNotFound,
            Self::TranscriptNotFound(_) => FailureKind::TranscriptNotFound,
            _ => FailureKind::BrowserError,
        }
    }

    /// True for the "page has no video/transcript" conditions, which must
    /// reach the caller unchanged.
    pub fn is_classified(&self) -> bool {
        matches!(self, Self::VideoNotFound(_) | Self::TranscriptNotFound(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::NavigationTimeout(_) | Self::WaitTimeout { .. }
        )
    }

    /// Collapse any unclassified error into a `Browser` error, leaving
    /// classified failures, interruption and already wrapped errors untouched.
    pub fn into_classified(self) -> Self {
        match self {
            Self::VideoNotFound(_)
            | Self::TranscriptNotFound(_)
            | Self::Browser(_)
            | Self::Interrupted => self,
            other => Self::Browser(other.to_string()),
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::VideoNotFound(_) => vec![
                "Check the video id or URL for typos".into(),
                "Private, removed or region-locked videos cannot be opened".into(),
            ],
            Self::TranscriptNotFound(_) => vec![
                "Not every video exposes a transcript".into(),
                "Retry with --headless false to inspect the page".into(),
            ],
            Self::Browser(_) | Self::LaunchFailed(_) => vec![
                "Ensure Chrome/Chromium is installed".into(),
                "Try specifying the executable with --chrome-path".into(),
                "Run with --verbose for more details".into(),
            ],
            Self::NavigationTimeout(timeout) => vec![
                format!("Increase timeout with --timeout {}", timeout + 30_000),
                "Check network connectivity".into(),
            ],
            Self::ConfigError(_) => vec![
                "Check configuration file syntax".into(),
                "Show the effective configuration with: transcript-grabber config show".into(),
            ],
            Self::InvalidVideoId(_) => vec![
                "Pass an 11-character video id or a full watch URL".into(),
            ],
            Self::BatchIncomplete { .. } => vec![
                "Save per-video errors with --results FILE".into(),
                "Failed ids can be retried with: transcript-grabber batch --file LIST".into(),
            ],
            Self::SaveIncomplete { .. } => vec![
                "Check that the output directory is writable".into(),
                "Extraction results are kept in the printed summary".into(),
            ],
            _ => vec!["Run with --verbose for more details".into()],
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::LaunchFailed(_) | Self::Connection(_) | Self::Browser(_) => 3,
            Self::NavigationTimeout(_) | Self::WaitTimeout { .. } => 4,
            Self::VideoNotFound(_) | Self::TranscriptNotFound(_) => 5,
            Self::IoError(_) | Self::SaveIncomplete { .. } => 6,
            Self::ConfigError(_) | Self::TomlDeError(_) | Self::TomlSerError(_) => 7,
            Self::InvalidVideoId(_) => 2,
            Self::Interrupted => 130,
            _ => 1,
        }
    }
}

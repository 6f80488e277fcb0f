use std::path::PathBuf;

use thiserror::Error;

/// Process-level error: a message plus the exit code the binary should return.
///
/// Exit codes:
/// - `2` configuration or input data problems
/// - `4` delivery problems (writer / mock clock)
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Errors raised by the library: ingestion and delivery.
///
/// Lookup misses during iteration are not errors and never show up here.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to open '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk '{}': {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("'{}' has no `Time` column", path.display())]
    MissingTimeColumn { path: PathBuf },

    #[error("'{}' line {line}: invalid timestamp '{value}'", path.display())]
    InvalidTimestamp {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("invalid step duration: {0}")]
    InvalidStep(String),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("mock-time update failed: {0}")]
    MockTime(String),

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl FeedError {
    /// Exit code used when this error terminates the process.
    pub fn exit_code(&self) -> u8 {
        match self {
            FeedError::Io { .. }
            | FeedError::Walk { .. }
            | FeedError::Csv { .. }
            | FeedError::MissingTimeColumn { .. }
            | FeedError::InvalidTimestamp { .. }
            | FeedError::InvalidStep(_) => 2,
            FeedError::Http { .. }
            | FeedError::UnexpectedStatus { .. }
            | FeedError::MockTime(_)
            | FeedError::Encode(_) => 4,
        }
    }
}

impl From<FeedError> for AppError {
    fn from(err: FeedError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;

//! Error types shared across the engine

use thiserror::Error;

/// Failure of a single request issued through a [`crate::http::Transport`].
///
/// Always treated as "inconclusive" for the probe that produced it.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("blocked out-of-scope request: {0}")]
    OutOfScope(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(0)
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Error dictionary could not be read
#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("malformed dictionary XML at byte {position}: {message}")]
    Xml { position: usize, message: String },

    #[error("dictionary has no <root> element")]
    MissingRoot,

    #[error("failed to read dictionary file: {0}")]
    Io(#[from] std::io::Error),
}

/// Scan configuration is unusable
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("ratio bounds must satisfy 0 <= lower < similarity < upper <= 1 (got lower={lower}, similarity={similarity}, upper={upper})")]
    RatioOrder { lower: f64, similarity: f64, upper: f64 },

    #[error("diff tolerance must be within (0, 1), got {0}")]
    DiffTolerance(f64),

    #[error("max comparison length must be greater than zero")]
    ZeroComparisonLength,

    #[error("at least one close type is required")]
    NoCloseTypes,

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}

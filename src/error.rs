//! Unified error types for the backend aggregator.

use thiserror::Error;

/// Unified error type for the aggregator.
#[derive(Error, Debug)]
pub enum AggregatorError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration was loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Backend request error.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// HTTP client construction or request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single backend call.
///
/// Never escapes the store: every variant is absorbed into the state of the
/// backend it belongs to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network-level failure (DNS, connection refused, timeout).
    #[error("{0}")]
    Transport(String),

    /// Body was not the JSON shape the endpoint promises.
    #[error("malformed response from {url}: {reason}")]
    Malformed {
        /// Requested URL.
        url: String,
        /// What was wrong with the body.
        reason: String,
    },

    /// Listing body parsed but had no usable `data` array.
    #[error("response from {url} has no data array")]
    MissingData {
        /// Requested URL.
        url: String,
    },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AggregatorError>;

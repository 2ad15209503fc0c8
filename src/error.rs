//! Error types
//!
//! `FetchError` covers a single HTTP exchange and is what the retry loops
//! inspect. `ScrapeError` is what a whole run can fail with.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("cancelled")]
    Cancelled,
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Malformed bodies and client errors (4xx other than 408/429) are
    /// deterministic, everything transport-level is worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) => true,
            FetchError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            FetchError::MalformedResponse(_) | FetchError::Cancelled => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("listing page at offset {offset} failed: {source}")]
    Listing {
        offset: usize,
        #[source]
        source: FetchError,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("export failed: {0}")]
    Export(#[from] csv::Error),

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;

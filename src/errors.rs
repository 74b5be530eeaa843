//! Typed error hierarchy for userbook.
//!
//! - `ClientError` — failures of a single request issued by the form controller
//! - `ConfigError` — configuration loading failures
//!
//! The collection service maps its failures onto HTTP responses through
//! `server::api::ApiError` instead.

use thiserror::Error;

/// Errors from one request against the collection endpoint.
///
/// The controller never surfaces these to the user beyond the failed-flag on
/// the triggering control; they are kept for logging and for callers that
/// talk to the transport directly.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server responded with status {status}")]
    Status { status: u16 },

    #[error("Failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Invalid base URL '{url}'")]
    InvalidBaseUrl { url: String },
}

impl ClientError {
    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Errors from loading `userbook.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

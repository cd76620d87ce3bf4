//! Error types for the nimbus capture pipeline.

use thiserror::Error;

/// Result type alias using nimbus's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for nimbus operations.
///
/// Only [`Error::InvalidInput`] is ever returned from the pipeline's public
/// entry point; every other variant is absorbed by a stage fallback.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller misuse: empty buffer, oversized upload, non-image content type
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// External provider (geocoding, weather) unavailable or misbehaving
    #[error("Provider error: {0}")]
    Provider(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

impl Error {
    /// Whether this error reflects caller misuse rather than environmental flakiness.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

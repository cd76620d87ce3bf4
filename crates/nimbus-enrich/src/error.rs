//! Failures of a single provider call.
//!
//! These never leave the crate's public lookups; each one is logged and
//! replaced by the documented fallback.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("AMAP_API_KEY is not configured")]
    MissingCredentials,

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    /// Amap answered but reported failure or an empty payload.
    #[error("No result (status {status}): {info}")]
    NotFound { status: String, info: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::Timeout => "timeout",
            Self::Network(_) => "network",
            Self::Status(_) => "status",
            Self::NotFound { .. } => "not_found",
            Self::Malformed(_) => "malformed",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<ProviderError> for nimbus_core::Error {
    fn from(e: ProviderError) -> Self {
        nimbus_core::Error::Provider(e.to_string())
    }
}

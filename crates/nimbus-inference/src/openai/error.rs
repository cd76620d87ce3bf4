//! Classification of chat completions failures.

use nimbus_core::Error;

/// OpenAI-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large (an oversized image, usually).
    ContextLengthExceeded,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) | (403, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) | (413, _) if error_type.contains("context_length") || status == 413 => {
                Self::ContextLengthExceeded
            }
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationError => "authentication",
            Self::RateLimitExceeded => "rate_limited",
            Self::ModelNotFound => "model_not_found",
            Self::ContextLengthExceeded => "too_large",
            Self::ServerError => "server_error",
            Self::Unknown => "unknown",
        }
    }
}

/// Convert a non-success answer into a provider error.
pub fn to_provider_error(status: u16, code: OpenAIErrorCode, message: &str) -> Error {
    Error::Provider(format!(
        "chat completions returned {} ({}): {}",
        status,
        code.as_str(),
        message
    ))
}

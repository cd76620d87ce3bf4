//! Generation backend configuration.
//!
//! Loaded from environment variables:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
//! | `OPENAI_API_KEY` | (none) |
//! | `OPENAI_GEN_MODEL` | `gpt-4o` |
//! | `OPENAI_TIMEOUT` | `30` |
//! | `OPENAI_CA_CERT` | (none) |

use std::env;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use nimbus_core::defaults;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for nimbus_core::Error {
    fn from(e: ConfigError) -> Self {
        nimbus_core::Error::Config(e.to_string())
    }
}

/// Configuration for the OpenAI-compatible generation backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for bearer authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model used for naming, description and recognition.
    pub gen_model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Connect timeout in seconds.
    pub connect_timeout_seconds: u64,
    /// Extra trusted CA (PEM).
    pub ca_cert: Option<PathBuf>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::OPENAI_URL.to_string(),
            api_key: None,
            gen_model: defaults::GEN_MODEL.to_string(),
            timeout_seconds: defaults::GEN_TIMEOUT_SECS,
            connect_timeout_seconds: defaults::CONNECT_TIMEOUT_SECS,
            ca_cert: None,
        }
    }
}

impl OpenAIConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> ConfigResult<Self> {
        let timeout_seconds = match env::var(defaults::ENV_OPENAI_TIMEOUT) {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: defaults::ENV_OPENAI_TIMEOUT,
                value: raw,
            })?,
            Err(_) => defaults::GEN_TIMEOUT_SECS,
        };

        let config = Self {
            base_url: env::var(defaults::ENV_OPENAI_BASE_URL)
                .unwrap_or_else(|_| defaults::OPENAI_URL.to_string()),
            api_key: env::var(defaults::ENV_OPENAI_API_KEY)
                .ok()
                .filter(|k| !k.trim().is_empty()),
            gen_model: env::var(defaults::ENV_OPENAI_GEN_MODEL)
                .unwrap_or_else(|_| defaults::GEN_MODEL.to_string()),
            timeout_seconds,
            connect_timeout_seconds: defaults::CONNECT_TIMEOUT_SECS,
            ca_cert: env::var(defaults::ENV_OPENAI_CA_CERT).ok().map(PathBuf::from),
        };
        config.validate()?;

        debug!(
            subsystem = "inference",
            component = "config",
            base_url = %config.base_url,
            model = %config.gen_model,
            timeout_secs = config.timeout_seconds,
            has_api_key = config.api_key.is_some(),
            "Loaded generation config"
        );
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.gen_model.trim().is_empty() {
            return Err(ConfigError::Validation("gen_model cannot be empty".to_string()));
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = OpenAIConfig::default();
        assert_eq!(config.gen_model, "gpt-4o");
        assert_eq!(config.timeout_seconds, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = OpenAIConfig {
            base_url: "ftp://example".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = OpenAIConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        let config = OpenAIConfig {
            gen_model: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_error_converts_to_core_error() {
        let err: nimbus_core::Error = ConfigError::Validation("bad".to_string()).into();
        assert!(matches!(err, nimbus_core::Error::Config(_)));
    }
}

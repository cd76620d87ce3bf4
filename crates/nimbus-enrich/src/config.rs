//! Enrichment provider configuration.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `AMAP_API_KEY` | (none; every lookup degrades to its fallback) |
//! | `AMAP_BASE_URL` | `https://restapi.amap.com/v3` |
//! | `AMAP_TIMEOUT` | `8` |
//! | `AMAP_CA_CERT` | (none) |
//! | `AMAP_DEFAULT_CITY_CODE` | `110101` |

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

/// Amap client configuration.
#[derive(Debug, Clone)]
pub struct AmapConfig {
    pub base_url: String,
    /// Missing key is not an error; lookups return fallbacks.
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub ca_cert: Option<PathBuf>,
    /// Administrative code used when the point cannot be resolved to one.
    pub default_city_code: String,
}

impl Default for AmapConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::AMAP_URL.to_string(),
            api_key: None,
            timeout_seconds: defaults::AMAP_TIMEOUT_SECS,
            connect_timeout_seconds: defaults::CONNECT_TIMEOUT_SECS,
            ca_cert: None,
            default_city_code: defaults::DEFAULT_CITY_CODE.to_string(),
        }
    }
}

impl AmapConfig {
    /// Config pointing at `base_url` with the given key; used by tests and demos.
    pub fn with_key(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    pub fn from_env() -> ConfigResult<Self> {
        let timeout_seconds = match env::var(defaults::ENV_AMAP_TIMEOUT) {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: defaults::ENV_AMAP_TIMEOUT,
                value: raw,
            })?,
            Err(_) => defaults::AMAP_TIMEOUT_SECS,
        };

        let config = Self {
            base_url: env::var(defaults::ENV_AMAP_BASE_URL)
                .unwrap_or_else(|_| defaults::AMAP_URL.to_string()),
            api_key: env::var(defaults::ENV_AMAP_API_KEY)
                .ok()
                .filter(|k| !k.trim().is_empty()),
            timeout_seconds,
            connect_timeout_seconds: defaults::CONNECT_TIMEOUT_SECS,
            ca_cert: env::var(defaults::ENV_AMAP_CA_CERT).ok().map(PathBuf::from),
            default_city_code: env::var(defaults::ENV_AMAP_DEFAULT_CITY_CODE)
                .ok()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| defaults::DEFAULT_CITY_CODE.to_string()),
        };
        config.validate()?;

        debug!(
            subsystem = "enrich",
            component = "config",
            base_url = %config.base_url,
            timeout_secs = config.timeout_seconds,
            has_api_key = config.api_key.is_some(),
            "Loaded enrichment config"
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
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.default_city_code.trim().is_empty()
            || !self.default_city_code.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ConfigError::Validation(format!(
                "default_city_code must be numeric, got '{}'",
                self.default_city_code
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AmapConfig::default();
        assert_eq!(config.base_url, "https://restapi.amap.com/v3");
        assert_eq!(config.timeout_seconds, 8);
        assert_eq!(config.default_city_code, "110101");
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_key() {
        let config = AmapConfig::with_key("http://127.0.0.1:9000", "k");
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = AmapConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_non_numeric_city_code() {
        let config = AmapConfig {
            default_city_code: "beijing".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = AmapConfig {
            base_url: "restapi.amap.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

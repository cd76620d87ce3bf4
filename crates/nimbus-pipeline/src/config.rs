//! Pipeline configuration.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `NIMBUS_MAX_IMAGE_BYTES` | `10485760` |
//! | `NIMBUS_DETAILED_DESCRIPTION` | `true` |
//! | `NIMBUS_DEFAULT_LATITUDE` / `NIMBUS_DEFAULT_LONGITUDE` | (none) |
//! | `NIMBUS_DEADLINE` | (none) |

use std::env;
use std::time::Duration;
use tracing::debug;

use nimbus_core::{defaults, GeoPoint};
use nimbus_inference::{ConfigError, ConfigResult};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upload size limit.
    pub max_image_bytes: usize,
    /// Issue a second, name-anchored description request.
    pub detailed_description: bool,
    /// Demo-mode point used when neither EXIF nor the caller supplies one.
    pub default_point: Option<GeoPoint>,
    /// Overall budget for one run; expired stages use fallbacks.
    pub deadline: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: defaults::MAX_IMAGE_BYTES,
            detailed_description: true,
            default_point: None,
            deadline: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> ConfigResult<Option<T>> {
    match env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        Err(_) => Ok(None),
    }
}

/// Accepts `true/false`, `1/0`, `yes/no`, `on/off`.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl PipelineConfig {
    pub fn from_env() -> ConfigResult<Self> {
        let max_image_bytes =
            parse_var(defaults::ENV_MAX_IMAGE_BYTES)?.unwrap_or(defaults::MAX_IMAGE_BYTES);

        let detailed_description = match env::var(defaults::ENV_DETAILED_DESCRIPTION) {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidValue {
                name: defaults::ENV_DETAILED_DESCRIPTION,
                value: raw,
            })?,
            Err(_) => true,
        };

        let latitude: Option<f64> = parse_var(defaults::ENV_DEFAULT_LATITUDE)?;
        let longitude: Option<f64> = parse_var(defaults::ENV_DEFAULT_LONGITUDE)?;
        let default_point = match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon).map_err(|e| {
                ConfigError::Validation(format!("default point: {}", e))
            })?),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Validation(format!(
                    "{} and {} must be set together",
                    defaults::ENV_DEFAULT_LATITUDE,
                    defaults::ENV_DEFAULT_LONGITUDE
                )))
            }
        };

        let deadline = parse_var::<u64>(defaults::ENV_DEADLINE)?.map(Duration::from_secs);

        let config = Self {
            max_image_bytes,
            detailed_description,
            default_point,
            deadline,
        };
        config.validate()?;

        debug!(
            subsystem = "pipeline",
            component = "config",
            max_image_bytes = config.max_image_bytes,
            detailed_description = config.detailed_description,
            has_default_point = config.default_point.is_some(),
            deadline_secs = config.deadline.map(|d| d.as_secs()),
            "Loaded pipeline config"
        );
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_image_bytes == 0 {
            return Err(ConfigError::Validation(
                "max_image_bytes must be greater than 0".to_string(),
            ));
        }
        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::Validation(
                "deadline must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_image_bytes, 10 * 1024 * 1024);
        assert!(config.detailed_description);
        assert!(config.default_point.is_none());
        assert!(config.deadline.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = PipelineConfig {
            max_image_bytes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            deadline: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }
}

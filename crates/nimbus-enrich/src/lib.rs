//! # nimbus-enrich
//!
//! Location and weather enrichment for captured cloud photos.
//!
//! [`AmapClient`] implements the [`nimbus_core::LocationProvider`] and
//! [`nimbus_core::WeatherProvider`] traits against the Amap REST API.

pub mod amap;
pub mod config;
pub mod error;

pub use amap::{icon_for, AmapClient};
pub use config::{AmapConfig, ConfigError, ConfigResult};
pub use error::ProviderError;

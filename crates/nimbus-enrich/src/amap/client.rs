//! Amap client: reverse geocoding, city codes and live weather.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, trace, warn, Span};

use nimbus_core::{
    defaults, http, logging, GeoPoint, LocationInfo, LocationProvider, LocationSource, Result,
    WeatherProvider, WeatherSnapshot, WeatherSource,
};

use super::types::{Regeocode, RegeoResponse, WeatherResponse};
use crate::config::AmapConfig;
use crate::error::ProviderError;

const REGEO_ENDPOINT: &str = "/geocode/regeo";
const WEATHER_ENDPOINT: &str = "/weather/weatherInfo";

/// Map Amap's Chinese weather text to an icon key.
pub fn icon_for(weather: &str) -> &'static str {
    if weather.contains('晴') {
        "clear"
    } else if weather.contains('云') {
        "clouds"
    } else if weather.contains('阴') {
        "overcast"
    } else if weather.contains('雨') {
        "rain"
    } else if weather.contains('雪') {
        "snow"
    } else if ['雾', '霾', '沙', '尘'].iter().any(|c| weather.contains(*c)) {
        "fog"
    } else {
        "default"
    }
}

/// Amap REST client. One pooled HTTP client is shared by every lookup.
pub struct AmapClient {
    client: Client,
    config: AmapConfig,
}

impl AmapClient {
    pub fn new(config: AmapConfig) -> Result<Self> {
        config.validate()?;
        let client = http::build_client(
            Duration::from_secs(config.timeout_seconds),
            Duration::from_secs(config.connect_timeout_seconds),
            config.ca_cert.as_deref(),
        )?;

        info!(
            subsystem = "enrich",
            component = "amap",
            base_url = %config.base_url,
            timeout_secs = config.timeout_seconds,
            has_api_key = config.api_key.is_some(),
            "Initializing Amap client"
        );
        if config.api_key.is_none() {
            warn!(
                subsystem = "enrich",
                component = "amap",
                "AMAP_API_KEY not configured, lookups will return fallbacks"
            );
        }

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(AmapConfig::from_env()?)
    }

    pub fn config(&self) -> &AmapConfig {
        &self.config
    }

    /// Administrative code of the area containing `point`.
    ///
    /// Falls back to the configured default code (Dongcheng, Beijing).
    #[instrument(
        skip(self),
        fields(subsystem = "enrich", component = "amap", op = "city_code", %point)
    )]
    pub async fn city_code(&self, point: &GeoPoint) -> String {
        match self.try_city_code(point).await {
            Ok(code) => {
                debug!(adcode = %code, "Resolved city code");
                code
            }
            Err(e) => {
                warn!(
                    error_kind = e.kind(),
                    error = %e,
                    fallback = %self.config.default_city_code,
                    "City code lookup failed, using default"
                );
                self.config.default_city_code.clone()
            }
        }
    }

    /// Geocode and fetch weather concurrently.
    pub async fn enrich(&self, point: &GeoPoint) -> (LocationInfo, WeatherSnapshot) {
        tokio::join!(
            LocationProvider::reverse_geocode(self, point),
            WeatherProvider::current_weather(self, point)
        )
    }

    fn api_key(&self) -> std::result::Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<T, ProviderError> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        trace!(endpoint, body = %body, "Raw Amap response");
        serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))
    }

    async fn try_regeo(&self, point: &GeoPoint) -> std::result::Result<Regeocode, ProviderError> {
        let key = self.api_key()?;
        // Amap takes "lon,lat".
        let location = format!("{:.6},{:.6}", point.longitude(), point.latitude());
        let resp: RegeoResponse = self
            .get_json(
                REGEO_ENDPOINT,
                &[("location", location.as_str()), ("key", key), ("extensions", "base")],
            )
            .await?;

        if !resp.envelope.is_ok() {
            return Err(ProviderError::NotFound {
                status: resp.envelope.status(),
                info: resp.envelope.info(),
            });
        }
        resp.regeocode.ok_or_else(|| ProviderError::NotFound {
            status: resp.envelope.status(),
            info: "empty regeocode".to_string(),
        })
    }

    async fn try_reverse_geocode(
        &self,
        point: &GeoPoint,
    ) -> std::result::Result<LocationInfo, ProviderError> {
        let regeo = self.try_regeo(point).await?;
        let formatted_address = regeo.formatted_address.ok_or_else(|| ProviderError::NotFound {
            status: "1".to_string(),
            info: "empty formatted_address".to_string(),
        })?;
        let component = regeo.address_component.unwrap_or_default();

        Ok(LocationInfo {
            formatted_address,
            city: component
                .best_city()
                .unwrap_or(defaults::FALLBACK_CITY)
                .to_string(),
            country: component
                .country
                .clone()
                .unwrap_or_else(|| defaults::FALLBACK_COUNTRY.to_string()),
            source: LocationSource::Geocoded,
        })
    }

    async fn try_city_code(&self, point: &GeoPoint) -> std::result::Result<String, ProviderError> {
        let regeo = self.try_regeo(point).await?;
        regeo
            .address_component
            .and_then(|c| c.adcode)
            .ok_or_else(|| ProviderError::NotFound {
                status: "1".to_string(),
                info: "missing adcode".to_string(),
            })
    }

    async fn try_current_weather(
        &self,
        point: &GeoPoint,
    ) -> std::result::Result<WeatherSnapshot, ProviderError> {
        let key = self.api_key()?;
        let city = self.city_code(point).await;
        let resp: WeatherResponse = self
            .get_json(
                WEATHER_ENDPOINT,
                &[("city", city.as_str()), ("key", key), ("extensions", "base")],
            )
            .await?;

        if !resp.envelope.is_ok() {
            return Err(ProviderError::NotFound {
                status: resp.envelope.status(),
                info: resp.envelope.info(),
            });
        }
        let live = resp
            .lives
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound {
                status: "1".to_string(),
                info: format!("no live weather for {}", city),
            })?;

        let weather = live
            .weather
            .ok_or_else(|| ProviderError::Malformed("missing weather text".to_string()))?;
        let raw_temp = live
            .temperature
            .ok_or_else(|| ProviderError::Malformed("missing temperature".to_string()))?;
        let temperature_celsius: f64 = raw_temp
            .parse()
            .map_err(|_| ProviderError::Malformed(format!("temperature '{}'", raw_temp)))?;

        Ok(WeatherSnapshot {
            condition: weather.clone(),
            icon_key: icon_for(&weather).to_string(),
            description: weather,
            temperature_celsius,
            source: WeatherSource::Live,
        })
    }
}

#[async_trait]
impl LocationProvider for AmapClient {
    #[instrument(
        skip(self),
        fields(
            subsystem = "enrich",
            component = "amap",
            op = "reverse_geocode",
            %point,
            duration_ms = tracing::field::Empty,
        )
    )]
    async fn reverse_geocode(&self, point: &GeoPoint) -> LocationInfo {
        let start = Instant::now();
        let location = match self.try_reverse_geocode(point).await {
            Ok(location) => {
                debug!(address = %location.formatted_address, city = %location.city, "Reverse geocoded");
                location
            }
            Err(e) => {
                warn!(
                    error_kind = e.kind(),
                    error = %e,
                    "Reverse geocoding failed, using coordinate placeholder"
                );
                // The caller relabels the source by where the point came from.
                LocationInfo::fallback(point, LocationSource::Provided)
            }
        };
        Span::current().record(logging::DURATION_MS, start.elapsed().as_millis() as u64);
        location
    }

    fn provider_name(&self) -> &str {
        "amap"
    }
}

#[async_trait]
impl WeatherProvider for AmapClient {
    #[instrument(
        skip(self),
        fields(
            subsystem = "enrich",
            component = "amap",
            op = "current_weather",
            %point,
            duration_ms = tracing::field::Empty,
        )
    )]
    async fn current_weather(&self, point: &GeoPoint) -> WeatherSnapshot {
        let start = Instant::now();
        let weather = match self.try_current_weather(point).await {
            Ok(weather) => {
                debug!(
                    weather = %weather.description,
                    temperature = weather.temperature_celsius,
                    "Fetched live weather"
                );
                weather
            }
            Err(e) => {
                warn!(
                    error_kind = e.kind(),
                    error = %e,
                    "Weather lookup failed, using fallback snapshot"
                );
                WeatherSnapshot::fallback()
            }
        };
        Span::current().record(logging::DURATION_MS, start.elapsed().as_millis() as u64);
        weather
    }

    fn provider_name(&self) -> &str {
        "amap"
    }
}

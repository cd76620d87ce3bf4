//! Core data models for the nimbus capture pipeline.
//!
//! These types are shared across all nimbus crates. Every field of an
//! [`EnrichedCapture`] is either a genuine value or a labeled fallback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::defaults;
use crate::error::{Error, Result};
use crate::persona::StylePersona;

// =============================================================================
// COORDINATES
// =============================================================================

/// A validated WGS-84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeoPointRepr")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct GeoPointRepr {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<GeoPointRepr> for GeoPoint {
    type Error = Error;

    fn try_from(repr: GeoPointRepr) -> Result<Self> {
        GeoPoint::new(repr.latitude, repr.longitude)
    }
}

impl GeoPoint {
    /// Build a point, rejecting out-of-range or non-finite values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidInput(format!(
                "latitude {} outside [-90, 90]",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidInput(format!(
                "longitude {} outside [-180, 180]",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Key used to deduplicate persisted locations (6-decimal rounding).
    pub fn dedup_key(&self) -> LocationKey {
        LocationKey {
            lat_micro: (self.latitude * 1e6).round() as i64,
            lon_micro: (self.longitude * 1e6).round() as i64,
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// Coordinates rounded to micro-degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    pub lat_micro: i64,
    pub lon_micro: i64,
}

// =============================================================================
// INPUT
// =============================================================================

/// A submitted photograph. Immutable once received.
#[derive(Debug, Clone)]
pub struct RawCapture {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

impl RawCapture {
    pub fn new(bytes: Vec<u8>, content_type: Option<&str>) -> Self {
        Self {
            bytes,
            content_type: content_type
                .map(str::trim)
                .filter(|ct| !ct.is_empty())
                .map(str::to_string),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Declared content type, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Optional user-supplied context accompanying a capture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<GeoPoint>,
}

impl CaptureHints {
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    pub fn with_weather(mut self, weather: impl Into<String>) -> Self {
        self.weather = Some(weather.into());
        self
    }

    pub fn with_point(mut self, point: GeoPoint) -> Self {
        self.point = Some(point);
        self
    }
}

// =============================================================================
// EXTRACTION AND RESOLUTION
// =============================================================================

/// Metadata decoded from the image's embedded EXIF directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    pub gps_point: Option<GeoPoint>,
    pub capture_timestamp: Option<DateTime<Utc>>,
}

impl ExtractedMetadata {
    pub fn is_empty(&self) -> bool {
        self.gps_point.is_none() && self.capture_timestamp.is_none()
    }
}

/// Where the coordinates used for enrichment came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "point", rename_all = "lowercase")]
pub enum ResolvedPoint {
    Exif(GeoPoint),
    Provided(GeoPoint),
    Configured(GeoPoint),
    Unknown,
}

impl ResolvedPoint {
    pub fn point(&self) -> Option<GeoPoint> {
        match self {
            ResolvedPoint::Exif(p) | ResolvedPoint::Provided(p) | ResolvedPoint::Configured(p) => {
                Some(*p)
            }
            ResolvedPoint::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolvedPoint::Exif(_) => "exif",
            ResolvedPoint::Provided(_) => "provided",
            ResolvedPoint::Configured(_) => "configured",
            ResolvedPoint::Unknown => "unknown",
        }
    }
}

/// Where the capture time came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSource {
    Exif,
    Provided,
    Clock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureTime {
    pub value: DateTime<Utc>,
    pub source: TimeSource,
}

// =============================================================================
// ENRICHMENT
// =============================================================================

/// Origin of a [`LocationInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    Exif,
    Provided,
    Geocoded,
    Unknown,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LocationSource::Exif => "exif",
            LocationSource::Provided => "provided",
            LocationSource::Geocoded => "geocoded",
            LocationSource::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Human-readable place description for a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub formatted_address: String,
    pub city: String,
    pub country: String,
    pub source: LocationSource,
}

impl LocationInfo {
    /// Coordinate placeholder used when the geocoder cannot be used.
    pub fn fallback(point: &GeoPoint, source: LocationSource) -> Self {
        Self {
            formatted_address: format!("位置 {:.4}, {:.4}", point.latitude(), point.longitude()),
            city: defaults::FALLBACK_CITY.to_string(),
            country: defaults::FALLBACK_COUNTRY.to_string(),
            source,
        }
    }

    /// Placeholder when no coordinates exist at all.
    pub fn unknown() -> Self {
        Self {
            formatted_address: defaults::UNKNOWN_ADDRESS.to_string(),
            city: defaults::FALLBACK_CITY.to_string(),
            country: defaults::FALLBACK_COUNTRY.to_string(),
            source: LocationSource::Unknown,
        }
    }

    pub fn is_geocoded(&self) -> bool {
        self.source == LocationSource::Geocoded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSource {
    Live,
    Fallback,
}

/// Weather observed at the capture point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub condition: String,
    pub description: String,
    pub icon_key: String,
    pub temperature_celsius: f64,
    pub source: WeatherSource,
}

impl WeatherSnapshot {
    pub fn fallback() -> Self {
        Self {
            condition: defaults::FALLBACK_WEATHER_CONDITION.to_string(),
            description: defaults::FALLBACK_WEATHER_DESCRIPTION.to_string(),
            icon_key: defaults::FALLBACK_WEATHER_ICON.to_string(),
            temperature_celsius: defaults::FALLBACK_TEMPERATURE_C,
            source: WeatherSource::Fallback,
        }
    }

    pub fn is_live(&self) -> bool {
        self.source == WeatherSource::Live
    }
}

// =============================================================================
// GENERATION
// =============================================================================

/// Visual traits of the depicted cloud.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CloudFeatures {
    pub shape: String,
    pub color: String,
    pub texture: String,
}

impl CloudFeatures {
    pub fn new(shape: impl Into<String>, color: impl Into<String>, texture: impl Into<String>) -> Self {
        Self {
            shape: shape.into(),
            color: color.into(),
            texture: texture.into(),
        }
    }

    /// Features assumed when recognition is unavailable.
    pub fn typical() -> Self {
        Self::new("积云", "白色", "蓬松")
    }

    /// Features reported when recognition produced nothing usable.
    pub fn unknown() -> Self {
        Self::new("未知", "未知", "未知")
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::unknown()
    }
}

/// Which recovery step produced a usable model answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryLevel {
    /// The whole body parsed as a JSON object.
    WholeBody,
    /// A fenced code block parsed as JSON.
    FencedBlock,
    /// Line-by-line scan for labeled fields.
    LineScan,
}

impl RecoveryLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryLevel::WholeBody => "whole_body",
            RecoveryLevel::FencedBlock => "fenced_block",
            RecoveryLevel::LineScan => "line_scan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "level", rename_all = "lowercase")]
pub enum GenerationOrigin {
    Model(RecoveryLevel),
    Fallback,
}

impl GenerationOrigin {
    pub fn is_fallback(&self) -> bool {
        matches!(self, GenerationOrigin::Fallback)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationOrigin::Model(level) => level.as_str(),
            GenerationOrigin::Fallback => "fallback",
        }
    }
}

/// A stylized name and description for a cloud.
///
/// Name and description are never empty: the constructor substitutes the
/// persona's fallback for blank model output and flags the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GenerationResultRepr")]
pub struct GenerationResult {
    name: String,
    description: String,
    persona: StylePersona,
    detected_features: CloudFeatures,
    keywords: Vec<String>,
    origin: GenerationOrigin,
    name_is_fallback: bool,
    description_is_fallback: bool,
}

#[derive(Deserialize)]
struct GenerationResultRepr {
    name: String,
    description: String,
    persona: StylePersona,
    detected_features: CloudFeatures,
    #[serde(default)]
    keywords: Vec<String>,
    origin: GenerationOrigin,
    #[serde(default)]
    name_is_fallback: bool,
    #[serde(default)]
    description_is_fallback: bool,
}

impl TryFrom<GenerationResultRepr> for GenerationResult {
    type Error = Error;

    fn try_from(repr: GenerationResultRepr) -> Result<Self> {
        if repr.name.trim().is_empty() || repr.description.trim().is_empty() {
            return Err(Error::InvalidInput(
                "generation result needs a name and a description".to_string(),
            ));
        }
        Ok(Self {
            name: repr.name,
            description: repr.description,
            persona: repr.persona,
            detected_features: repr.detected_features,
            keywords: repr.keywords,
            origin: repr.origin,
            name_is_fallback: repr.name_is_fallback || repr.origin.is_fallback(),
            description_is_fallback: repr.description_is_fallback || repr.origin.is_fallback(),
        })
    }
}

impl GenerationResult {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        persona: StylePersona,
        detected_features: CloudFeatures,
        origin: GenerationOrigin,
    ) -> Self {
        let name = name.into().trim().to_string();
        let description = description.into().trim().to_string();
        let name_is_fallback = origin.is_fallback() || name.is_empty();
        let description_is_fallback = origin.is_fallback() || description.is_empty();
        let name = if name.is_empty() {
            persona.fallback_name(&detected_features).to_string()
        } else {
            name
        };
        let description = if description.is_empty() {
            persona.fallback_description(&detected_features)
        } else {
            description
        };
        Self {
            name,
            description,
            persona,
            detected_features,
            keywords: Vec::new(),
            origin,
            name_is_fallback,
            description_is_fallback,
        }
    }

    /// Persona fallback for when no model answer is usable.
    pub fn fallback(persona: StylePersona, features: CloudFeatures) -> Self {
        Self::new("", "", persona, features, GenerationOrigin::Fallback)
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    /// Replace the description, keeping the name. Blank text is ignored.
    pub fn with_description(mut self, described: CloudDescription) -> Self {
        let text = described.description.trim();
        if !text.is_empty() {
            self.description = text.to_string();
            self.description_is_fallback = described.origin.is_fallback();
        }
        if !described.keywords.is_empty() {
            self = self.with_keywords(described.keywords);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn persona(&self) -> StylePersona {
        self.persona
    }

    pub fn detected_features(&self) -> &CloudFeatures {
        &self.detected_features
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn origin(&self) -> GenerationOrigin {
        self.origin
    }

    /// The name is a persona placeholder, not model output.
    pub fn name_is_fallback(&self) -> bool {
        self.name_is_fallback
    }

    /// The description is a persona placeholder, not model output.
    pub fn description_is_fallback(&self) -> bool {
        self.description_is_fallback
    }
}

/// Output of a description request anchored on an existing name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudDescription {
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub origin: GenerationOrigin,
}

// =============================================================================
// OUTPUT
// =============================================================================

/// A field of [`EnrichedCapture`] that carries a fallback value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedField {
    Point,
    CaptureTime,
    Location,
    Weather,
    Name,
    Description,
}

/// The fully enriched, persistable capture record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedCapture {
    pub metadata: ExtractedMetadata,
    pub resolved_point: ResolvedPoint,
    pub captured_at: CaptureTime,
    pub location: LocationInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherSnapshot>,
    pub generation: GenerationResult,
    #[serde(default)]
    pub degraded: Vec<DegradedField>,
}

impl EnrichedCapture {
    pub fn is_degraded(&self, field: DegradedField) -> bool {
        self.degraded.contains(&field)
    }
}

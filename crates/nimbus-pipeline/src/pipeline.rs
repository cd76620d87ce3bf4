//! Capture enrichment pipeline.
//!
//! Validate → Extract → Resolve → Enrich → Generate. Only validation can
//! reject a capture; every later stage degrades into a labeled fallback and
//! the run always produces an [`EnrichedCapture`].

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::Instant as Deadline;
use tracing::{debug, info, instrument, warn, Span};

use nimbus_core::exif::parse_exif_datetime;
use nimbus_core::{
    extract_metadata, logging, sniff_content_type, validate_capture, CaptureHints, CaptureTime,
    CloudFeatures, DegradedField, EnrichedCapture, ExtractedMetadata, GenerationResult,
    ImageAttachment, LocationInfo, LocationProvider, LocationSource,
    RawCapture, ResolvedPoint, Result, StylePersona, TimeSource, WeatherProvider, WeatherSnapshot,
};
use nimbus_enrich::AmapClient;
use nimbus_inference::{CloudNamer, OpenAIBackend, PromptContext};

use crate::clock::{Clock, SystemClock};
use crate::config::PipelineConfig;

/// Parse a caller-supplied capture time.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and the
/// EXIF `YYYY:MM:DD HH:MM:SS` layout. Zone-less values are taken as UTC.
pub fn parse_time_hint(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .map(|naive| naive.and_utc())
        .or_else(|| parse_exif_datetime(raw))
}

/// Label a placeholder location by where its point came from.
fn placeholder_source(point: &ResolvedPoint) -> LocationSource {
    match point {
        ResolvedPoint::Exif(_) => LocationSource::Exif,
        ResolvedPoint::Provided(_) | ResolvedPoint::Configured(_) => LocationSource::Provided,
        ResolvedPoint::Unknown => LocationSource::Unknown,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Runs captures through every enrichment stage.
pub struct CapturePipeline {
    config: PipelineConfig,
    location: Arc<dyn LocationProvider>,
    weather: Arc<dyn WeatherProvider>,
    namer: CloudNamer,
    clock: Arc<dyn Clock>,
}

impl CapturePipeline {
    pub fn new(
        config: PipelineConfig,
        location: Arc<dyn LocationProvider>,
        weather: Arc<dyn WeatherProvider>,
        namer: CloudNamer,
    ) -> Self {
        Self {
            config,
            location,
            weather,
            namer,
            clock: Arc::new(SystemClock),
        }
    }

    /// Pipeline backed by one Amap client for both lookups.
    pub fn with_amap(config: PipelineConfig, amap: Arc<AmapClient>, namer: CloudNamer) -> Self {
        let location: Arc<dyn LocationProvider> = amap.clone();
        Self::new(config, location, amap, namer)
    }

    /// Build every collaborator from environment variables.
    pub fn from_env() -> Result<Self> {
        let config = PipelineConfig::from_env()?;
        let amap = Arc::new(AmapClient::from_env()?);
        let namer = CloudNamer::new(Arc::new(OpenAIBackend::from_env()?));
        Ok(Self::with_amap(config, amap, namer))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Enrich one capture.
    ///
    /// Fails only with [`nimbus_core::Error::InvalidInput`].
    #[instrument(
        skip(self, capture, hints),
        fields(
            subsystem = "pipeline",
            component = "orchestrator",
            op = "enrich",
            %persona,
            image_len = capture.len(),
            point_source = tracing::field::Empty,
            degraded = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        )
    )]
    pub async fn enrich(
        &self,
        capture: &RawCapture,
        persona: StylePersona,
        hints: &CaptureHints,
    ) -> Result<EnrichedCapture> {
        let start = Instant::now();
        let deadline = self.config.deadline.map(|budget| Deadline::now() + budget);

        self.validate(capture)?;

        let metadata = self.extract(capture);
        let resolved_point = self.resolve_point(&metadata, hints);
        let captured_at = self.resolve_time(&metadata, hints);
        Span::current().record(logging::POINT_SOURCE, resolved_point.as_str());

        let (location, weather) = self.enrich_point(&resolved_point, deadline).await;

        let context = self.prompt_context(&captured_at, &location, weather.as_ref(), hints);
        let generation = self.generate(capture, persona, &context, deadline).await;

        let degraded = Self::degraded_fields(
            &resolved_point,
            &captured_at,
            &location,
            weather.as_ref(),
            &generation,
        );

        let span = Span::current();
        span.record(logging::DEGRADED, degraded.len());
        span.record(logging::DURATION_MS, start.elapsed().as_millis() as u64);
        info!(
            cloud_name = generation.name(),
            origin = generation.origin().as_str(),
            address = %location.formatted_address,
            degraded = ?degraded,
            "Capture enriched"
        );

        Ok(EnrichedCapture {
            metadata,
            resolved_point,
            captured_at,
            location,
            weather,
            generation,
            degraded,
        })
    }

    #[instrument(skip_all, fields(stage = "validate"))]
    fn validate(&self, capture: &RawCapture) -> Result<()> {
        validate_capture(capture, self.config.max_image_bytes).map_err(|e| {
            warn!(error = %e, "Rejected capture");
            e
        })
    }

    #[instrument(skip_all, fields(stage = "extract"))]
    fn extract(&self, capture: &RawCapture) -> ExtractedMetadata {
        let metadata = extract_metadata(capture.bytes());
        debug!(
            has_gps = metadata.gps_point.is_some(),
            has_timestamp = metadata.capture_timestamp.is_some(),
            "Extracted metadata"
        );
        metadata
    }

    fn resolve_point(&self, metadata: &ExtractedMetadata, hints: &CaptureHints) -> ResolvedPoint {
        let resolved = if let Some(point) = metadata.gps_point {
            ResolvedPoint::Exif(point)
        } else if let Some(point) = hints.point {
            ResolvedPoint::Provided(point)
        } else if let Some(point) = self.config.default_point {
            ResolvedPoint::Configured(point)
        } else {
            ResolvedPoint::Unknown
        };
        debug!(stage = "resolve", point_source = resolved.as_str(), "Resolved coordinates");
        resolved
    }

    fn resolve_time(&self, metadata: &ExtractedMetadata, hints: &CaptureHints) -> CaptureTime {
        if let Some(value) = metadata.capture_timestamp {
            return CaptureTime {
                value,
                source: TimeSource::Exif,
            };
        }
        if let Some(raw) = non_blank(hints.time.as_deref()) {
            match parse_time_hint(raw) {
                Some(value) => {
                    return CaptureTime {
                        value,
                        source: TimeSource::Provided,
                    }
                }
                None => debug!(stage = "resolve", hint = raw, "Unparseable time hint"),
            }
        }
        CaptureTime {
            value: self.clock.now(),
            source: TimeSource::Clock,
        }
    }

    #[instrument(skip_all, fields(stage = "enrich", point_source = resolved.as_str()))]
    async fn enrich_point(
        &self,
        resolved: &ResolvedPoint,
        deadline: Option<Deadline>,
    ) -> (LocationInfo, Option<WeatherSnapshot>) {
        let Some(point) = resolved.point() else {
            debug!("No coordinates, skipping geocoding and weather");
            return (LocationInfo::unknown(), None);
        };

        let lookups = async {
            tokio::join!(
                self.location.reverse_geocode(&point),
                self.weather.current_weather(&point)
            )
        };
        let (location, weather) = within(deadline, "enrich", lookups)
            .await
            .unwrap_or_else(|| (LocationInfo::unknown(), WeatherSnapshot::fallback()));

        let location = if location.is_geocoded() {
            location
        } else {
            LocationInfo::fallback(&point, placeholder_source(resolved))
        };
        (location, Some(weather))
    }

    fn prompt_context(
        &self,
        captured_at: &CaptureTime,
        location: &LocationInfo,
        weather: Option<&WeatherSnapshot>,
        hints: &CaptureHints,
    ) -> PromptContext {
        let weather = non_blank(hints.weather.as_deref())
            .map(str::to_string)
            .or_else(|| weather.filter(|w| w.is_live()).map(|w| w.description.clone()));
        let place = non_blank(hints.place.as_deref())
            .map(str::to_string)
            .or_else(|| location.is_geocoded().then(|| location.formatted_address.clone()));

        PromptContext {
            time: Some(captured_at.value.to_rfc3339_opts(SecondsFormat::Secs, true)),
            weather,
            place,
        }
    }

    /// Name from the photo, then optionally a name-anchored description.
    ///
    /// The description request is skipped when naming already fell back.
    #[instrument(skip_all, fields(stage = "generate", %persona, model = self.namer.model_name()))]
    async fn generate(
        &self,
        capture: &RawCapture,
        persona: StylePersona,
        context: &PromptContext,
        deadline: Option<Deadline>,
    ) -> GenerationResult {
        let mime = capture
            .content_type()
            .or_else(|| sniff_content_type(capture.bytes()))
            .unwrap_or("image/jpeg");
        let image = ImageAttachment::new(mime, capture.bytes().to_vec());

        let named = within(deadline, "name", self.namer.name_from_image(persona, &image, context))
            .await
            .unwrap_or_else(|| GenerationResult::fallback(persona, CloudFeatures::unknown()));

        if !self.config.detailed_description {
            return named;
        }
        if named.origin().is_fallback() {
            debug!("Naming fell back, skipping description request");
            return named;
        }

        let describe = self.namer.describe(
            persona,
            named.name(),
            Some(&image),
            named.detected_features(),
            context,
        );
        let described = within(deadline, "describe", describe).await;
        match described {
            Some(described) if !described.origin.is_fallback() => named.with_description(described),
            _ => named,
        }
    }

    fn degraded_fields(
        resolved: &ResolvedPoint,
        captured_at: &CaptureTime,
        location: &LocationInfo,
        weather: Option<&WeatherSnapshot>,
        generation: &GenerationResult,
    ) -> Vec<DegradedField> {
        let mut degraded = Vec::new();
        if matches!(resolved, ResolvedPoint::Unknown | ResolvedPoint::Configured(_)) {
            degraded.push(DegradedField::Point);
        }
        if captured_at.source == TimeSource::Clock {
            degraded.push(DegradedField::CaptureTime);
        }
        if !location.is_geocoded() {
            degraded.push(DegradedField::Location);
        }
        if weather.map_or(true, |w| !w.is_live()) {
            degraded.push(DegradedField::Weather);
        }
        if generation.name_is_fallback() {
            degraded.push(DegradedField::Name);
        }
        if generation.description_is_fallback() {
            degraded.push(DegradedField::Description);
        }
        degraded
    }
}

/// Run `fut` until the optional deadline; `None` when it expires first.
async fn within<F: Future>(deadline: Option<Deadline>, stage: &'static str, fut: F) -> Option<F::Output> {
    match deadline {
        None => Some(fut.await),
        Some(at) => match tokio::time::timeout_at(at, fut).await {
            Ok(output) => Some(output),
            Err(_) => {
                warn!(stage, "Deadline expired, using fallbacks");
                None
            }
        },
    }
}

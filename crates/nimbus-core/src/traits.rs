//! Provider traits for the external collaborators of the pipeline.

use async_trait::async_trait;
use std::sync::Arc;

use crate::defaults;
use crate::error::Result;
use crate::models::{GeoPoint, LocationInfo, WeatherSnapshot};

// =============================================================================
// ENRICHMENT TRAITS
// =============================================================================

/// Reverse geocoding. Implementations absorb their own failures and return
/// a labeled fallback instead of an error.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn reverse_geocode(&self, point: &GeoPoint) -> LocationInfo;

    /// Provider name for logging.
    fn provider_name(&self) -> &str;
}

/// Current weather lookup. Failures degrade to [`WeatherSnapshot::fallback`].
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, point: &GeoPoint) -> WeatherSnapshot;

    fn provider_name(&self) -> &str;
}

// =============================================================================
// GENERATION TRAITS
// =============================================================================

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub max_tokens: u32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            temperature: defaults::GEN_TEMPERATURE,
            top_p: defaults::GEN_TOP_P,
            frequency_penalty: defaults::GEN_FREQUENCY_PENALTY,
            presence_penalty: defaults::GEN_PRESENCE_PENALTY,
            max_tokens: defaults::GEN_MAX_TOKENS,
        }
    }
}

/// An image attached to a generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: Arc<[u8]>,
}

impl ImageAttachment {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

/// A single-turn generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image: Option<ImageAttachment>,
    pub sampling: Sampling,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            sampling: Sampling::default(),
        }
    }

    pub fn with_image(prompt: impl Into<String>, image: ImageAttachment) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(image),
            sampling: Sampling::default(),
        }
    }
}

/// Backend for text (and optionally vision) generation.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Return the raw text of the model's answer.
    async fn complete(&self, request: &GenerationRequest) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_defaults() {
        let s = Sampling::default();
        assert_eq!(s.temperature, 1.1);
        assert_eq!(s.top_p, 0.9);
        assert_eq!(s.frequency_penalty, 0.8);
        assert_eq!(s.presence_penalty, 0.6);
        assert_eq!(s.max_tokens, 500);
    }

    #[test]
    fn test_request_constructors() {
        let text = GenerationRequest::text("hello");
        assert!(text.image.is_none());

        let image = ImageAttachment::new("image/jpeg", vec![1u8, 2, 3]);
        let req = GenerationRequest::with_image("describe", image.clone());
        assert_eq!(req.image, Some(image));
        assert_eq!(req.sampling, Sampling::default());
    }
}

//! Generative request orchestration.
//!
//! [`CloudNamer`] builds prompts, calls the backend and runs recovery. None
//! of its methods fail: transport errors, non-success statuses and unusable
//! answers all end in the persona's deterministic fallback.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn, Span};

use nimbus_core::{
    logging, CloudDescription, CloudFeatures, GenerationBackend, GenerationOrigin,
    GenerationRequest, GenerationResult, ImageAttachment, StylePersona,
};

use crate::prompt::{self, PromptContext};
use crate::recovery::{self, RecoveryExhausted};

/// Orchestrates naming, description and recognition requests.
#[derive(Clone)]
pub struct CloudNamer {
    backend: Arc<dyn GenerationBackend>,
}

impl CloudNamer {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Send one request; `None` on any failure.
    async fn ask(&self, op: &'static str, request: GenerationRequest) -> Option<String> {
        let start = Instant::now();
        match self.backend.complete(&request).await {
            Ok(text) => {
                Span::current().record(logging::DURATION_MS, start.elapsed().as_millis() as u64);
                Some(text)
            }
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "namer",
                    op,
                    model = self.backend.model_name(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "Generation request failed, using fallback"
                );
                None
            }
        }
    }

    fn request(prompt: String, image: Option<&ImageAttachment>) -> GenerationRequest {
        match image {
            Some(image) => GenerationRequest::with_image(prompt, image.clone()),
            None => GenerationRequest::text(prompt),
        }
    }

    /// Name a cloud from already-known features.
    #[instrument(
        skip(self, features, context),
        fields(subsystem = "inference", op = "name_from_features", %persona, recovery_level = tracing::field::Empty, duration_ms = tracing::field::Empty)
    )]
    pub async fn name_from_features(
        &self,
        persona: StylePersona,
        features: &CloudFeatures,
        context: &PromptContext,
    ) -> GenerationResult {
        let prompt = prompt::naming_prompt_from_features(persona, features, context);
        let raw = self.ask("name_from_features", GenerationRequest::text(prompt)).await;

        let result = raw
            .ok_or(RecoveryExhausted { len: 0 })
            .and_then(|raw| recovery::recover_generation(&raw, persona, features))
            .unwrap_or_else(|e| {
                warn!(subsystem = "inference", op = "name_from_features", error = %e, "Using persona fallback name");
                GenerationResult::fallback(persona, features.clone())
            });
        record_origin(result.origin());
        result
    }

    /// Name a cloud directly from the photo.
    #[instrument(
        skip(self, image, context),
        fields(subsystem = "inference", op = "name_from_image", %persona, image_len = image.data.len(), recovery_level = tracing::field::Empty, duration_ms = tracing::field::Empty)
    )]
    pub async fn name_from_image(
        &self,
        persona: StylePersona,
        image: &ImageAttachment,
        context: &PromptContext,
    ) -> GenerationResult {
        let prompt = prompt::naming_prompt_from_image(persona, context);
        let raw = self
            .ask("name_from_image", Self::request(prompt, Some(image)))
            .await;

        // Features the model did not report stay unknown.
        let result = raw
            .ok_or(RecoveryExhausted { len: 0 })
            .and_then(|raw| recovery::recover_generation(&raw, persona, &CloudFeatures::unknown()))
            .unwrap_or_else(|e| {
                warn!(subsystem = "inference", op = "name_from_image", error = %e, "Using persona fallback name");
                GenerationResult::fallback(persona, CloudFeatures::unknown())
            });
        record_origin(result.origin());
        result
    }

    /// Describe a named cloud, with or without the photo.
    #[instrument(
        skip(self, image, features, context),
        fields(subsystem = "inference", op = "describe", %persona, recovery_level = tracing::field::Empty, duration_ms = tracing::field::Empty)
    )]
    pub async fn describe(
        &self,
        persona: StylePersona,
        name: &str,
        image: Option<&ImageAttachment>,
        features: &CloudFeatures,
        context: &PromptContext,
    ) -> CloudDescription {
        let known = (!features.is_unknown()).then_some(features);
        let prompt = prompt::description_prompt(persona, Some(name), known, context);
        let raw = self.ask("describe", Self::request(prompt, image)).await;

        let recovered = raw
            .as_deref()
            .map(recovery::parse_response)
            .and_then(Result::ok)
            .and_then(|fields| fields.description.map(|d| (d, fields.keywords, fields.level)));

        let described = match recovered {
            Some((description, keywords, level)) => CloudDescription {
                description,
                keywords: if keywords.is_empty() {
                    feature_keywords(features)
                } else {
                    keywords
                },
                origin: level.map(GenerationOrigin::Model).unwrap_or(GenerationOrigin::Fallback),
            },
            None => {
                warn!(subsystem = "inference", op = "describe", "Using persona fallback description");
                CloudDescription {
                    description: persona.fallback_description(features),
                    keywords: feature_keywords(features),
                    origin: GenerationOrigin::Fallback,
                }
            }
        };
        record_origin(described.origin);
        described
    }

    /// Recognize shape, color and texture in the photo.
    #[instrument(
        skip(self, image),
        fields(subsystem = "inference", op = "analyze_features", image_len = image.data.len(), duration_ms = tracing::field::Empty)
    )]
    pub async fn analyze_features(&self, image: &ImageAttachment) -> CloudFeatures {
        let raw = self
            .ask(
                "analyze_features",
                Self::request(prompt::feature_analysis_prompt(), Some(image)),
            )
            .await;

        match raw.as_deref().and_then(recovery::parse_features) {
            Some(features) => {
                debug!(shape = %features.shape, color = %features.color, texture = %features.texture, "Recognized features");
                features
            }
            None => {
                warn!(subsystem = "inference", op = "analyze_features", "Recognition unusable, assuming typical features");
                CloudFeatures::typical()
            }
        }
    }
}

fn feature_keywords(features: &CloudFeatures) -> Vec<String> {
    if features.is_unknown() {
        return Vec::new();
    }
    vec![
        features.color.clone(),
        features.shape.clone(),
        features.texture.clone(),
    ]
}

fn record_origin(origin: GenerationOrigin) {
    Span::current().record(logging::RECOVERY_LEVEL, origin.as_str());
}

//! OpenAI-compatible generation backend implementation.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, trace, Span};

use nimbus_core::{
    http, logging, Error, GenerationBackend, GenerationRequest, ImageAttachment, Result,
};

use super::error::{to_provider_error, OpenAIErrorCode};
use super::types::*;
use crate::config::OpenAIConfig;

/// OpenAI-compatible generation backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        config.validate()?;
        let client = http::build_client(
            Duration::from_secs(config.timeout_seconds),
            Duration::from_secs(config.connect_timeout_seconds),
            config.ca_cert.as_deref(),
        )?;

        info!(
            subsystem = "inference",
            component = "openai",
            base_url = %config.base_url,
            model = %config.gen_model,
            timeout_secs = config.timeout_seconds,
            "Initializing OpenAI backend"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env()?)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Build a request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        req.header("Content-Type", "application/json")
    }

    fn build_body(&self, request: &GenerationRequest) -> ChatCompletionRequest {
        let content = match &request.image {
            None => MessageContent::Text(request.prompt.clone()),
            Some(image) => MessageContent::Parts(vec![
                ContentPart::Text {
                    text: request.prompt.clone(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: data_url(image),
                    },
                },
            ]),
        };

        ChatCompletionRequest {
            model: self.config.gen_model.clone(),
            messages: vec![ChatMessage::user(content)],
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
            frequency_penalty: request.sampling.frequency_penalty,
            presence_penalty: request.sampling.presence_penalty,
            max_tokens: request.sampling.max_tokens,
            stream: false,
        }
    }
}

/// Encode an image as a `data:` URL.
pub fn data_url(image: &ImageAttachment) -> String {
    let mime = if image.mime_type.trim().is_empty() {
        "image/jpeg"
    } else {
        image.mime_type.trim()
    };
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(&image.data)
    )
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    #[instrument(
        skip(self, request),
        fields(
            subsystem = "inference",
            component = "openai",
            op = "complete",
            model = %self.config.gen_model,
            prompt_len = request.prompt.len(),
            has_image = request.image.is_some(),
            duration_ms = tracing::field::Empty,
            response_len = tracing::field::Empty,
        )
    )]
    async fn complete(&self, request: &GenerationRequest) -> Result<String> {
        let start = Instant::now();
        let body = self.build_body(request);

        let response = self
            .build_request("/chat/completions")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Provider(format!("chat completions timed out: {}", e))
                } else {
                    Error::Provider(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: OpenAIErrorResponse = response.json().await.unwrap_or(OpenAIErrorResponse {
                error: OpenAIError {
                    message: "Unknown error".to_string(),
                    error_type: "unknown".to_string(),
                    code: None,
                },
            });
            let code = OpenAIErrorCode::from_response(status.as_u16(), &body.error.error_type);
            return Err(to_provider_error(status.as_u16(), code, &body.error.message));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let span = Span::current();
        span.record(logging::DURATION_MS, start.elapsed().as_millis() as u64);
        span.record(logging::RESPONSE_LEN, content.len());
        trace!(response = %content, "Raw completion");
        debug!("Generation complete");
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }
}

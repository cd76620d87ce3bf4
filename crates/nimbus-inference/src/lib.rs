//! # nimbus-inference
//!
//! Generative naming for captured clouds: an OpenAI-compatible chat
//! completions backend, persona prompts, and the response recovery cascade.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nimbus_core::{ImageAttachment, StylePersona};
//! use nimbus_inference::{openai::OpenAIBackend, CloudNamer, PromptContext};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = Arc::new(OpenAIBackend::from_env().unwrap());
//!     let namer = CloudNamer::new(backend);
//!     let image = ImageAttachment::new("image/jpeg", std::fs::read("cloud.jpg").unwrap());
//!     let result = namer
//!         .name_from_image(StylePersona::PlayfulChild, &image, &PromptContext::default())
//!         .await;
//!     println!("{}: {}", result.name(), result.description());
//! }
//! ```

pub mod config;
pub mod generator;
pub mod openai;
pub mod prompt;
pub mod recovery;

pub use config::{ConfigError, ConfigResult, OpenAIConfig};
pub use generator::CloudNamer;
pub use openai::OpenAIBackend;
pub use prompt::PromptContext;
pub use recovery::{parse_response, recover_generation, RecoveredFields, RecoveryExhausted};

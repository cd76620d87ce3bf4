//! OpenAI-compatible generation backend.
//!
//! Works with any endpoint implementing `POST /chat/completions`, including
//! vision-capable models that accept `image_url` content parts.
//!
//! # Example
//!
//! ```rust,no_run
//! use nimbus_core::{GenerationBackend, GenerationRequest};
//! use nimbus_inference::openai::OpenAIBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIBackend::from_env().unwrap();
//!     let text = backend
//!         .complete(&GenerationRequest::text("给这朵云起个名字"))
//!         .await
//!         .unwrap();
//!     println!("{}", text);
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{data_url, OpenAIBackend};
pub use error::{to_provider_error, OpenAIErrorCode};
pub use types::*;

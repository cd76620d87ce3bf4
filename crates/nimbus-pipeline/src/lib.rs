//! # nimbus-pipeline
//!
//! Turns a submitted cloud photo plus optional hints into an
//! [`EnrichedCapture`](nimbus_core::EnrichedCapture): coordinates, place,
//! weather and a persona-styled name and description. Every stage except
//! input validation degrades to a labeled fallback instead of failing.
//!
//! # Example
//!
//! ```rust,no_run
//! use nimbus_core::{CaptureHints, RawCapture, StylePersona};
//! use nimbus_pipeline::CapturePipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pipeline = CapturePipeline::from_env()?;
//!     let capture = RawCapture::new(std::fs::read("cloud.jpg")?, Some("image/jpeg"));
//!     let hints = CaptureHints::default().with_place("当前位置");
//!     let enriched = pipeline
//!         .enrich(&capture, StylePersona::PossessiveCat, &hints)
//!         .await?;
//!     println!("{}", enriched.generation.name());
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod pipeline;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::PipelineConfig;
pub use pipeline::{parse_time_hint, CapturePipeline};

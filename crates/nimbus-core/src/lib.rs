//! # nimbus-core
//!
//! Core types, codecs, and provider traits for the nimbus capture pipeline.
//!
//! This crate provides the data model, the GPS codec, EXIF extraction, the
//! persona catalogue and capture validation that the other nimbus crates
//! build on.

pub mod defaults;
pub mod error;
pub mod exif;
pub mod file_safety;
pub mod gps;
pub mod http;
pub mod logging;
pub mod models;
pub mod persona;
pub mod traits;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use crate::exif::extract_metadata;
pub use file_safety::{is_image_mime, sniff_content_type, validate_capture};
pub use gps::{Axis, CoordinateError, DmsTriple, Hemisphere, Rational};
pub use models::*;
pub use persona::{PersonaStyle, StylePersona};
pub use traits::*;

//! Structured logging schema and field name constants.
//!
//! All crates use these names for structured `tracing` fields so that log
//! aggregation can query every stage of a capture run the same way.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Run completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Raw provider payloads |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "pipeline", "enrich", "inference", "exif"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "amap", "openai", "recovery", "orchestrator"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "reverse_geocode", "current_weather", "complete", "enrich"
pub const OPERATION: &str = "op";

// ─── Capture fields ────────────────────────────────────────────────────────

/// Persona identifier used for generation.
pub const PERSONA: &str = "persona";

/// Byte length of the submitted image.
pub const IMAGE_LEN: &str = "image_len";

/// Origin of the resolved coordinates ("exif", "provided", "configured", "unknown").
pub const POINT_SOURCE: &str = "point_source";

/// Recovery level that produced a generation result.
pub const RECOVERY_LEVEL: &str = "recovery_level";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Number of fields that carry a fallback value.
pub const DEGRADED: &str = "degraded";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

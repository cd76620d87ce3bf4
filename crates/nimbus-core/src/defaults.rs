//! Centralized default constants for the nimbus capture pipeline.
//!
//! **This module is the single source of truth** for shared default values,
//! environment variable names and the documented fallback payloads returned
//! when an external provider cannot be used.

// =============================================================================
// CAPTURE VALIDATION
// =============================================================================

/// Maximum accepted image size in bytes (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Content type prefix accepted for captures.
pub const IMAGE_CONTENT_PREFIX: &str = "image/";

// =============================================================================
// ENRICHMENT PROVIDER (Amap)
// =============================================================================

/// Base URL of the Amap REST API.
pub const AMAP_URL: &str = "https://restapi.amap.com/v3";

/// Request timeout for geocoding and weather calls, in seconds.
///
/// The enrichment is advisory and sits on a user-facing request path.
pub const AMAP_TIMEOUT_SECS: u64 = 8;

/// Connect timeout for provider calls, in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 3;

/// Administrative code used when city resolution fails (Dongcheng, Beijing).
pub const DEFAULT_CITY_CODE: &str = "110101";

/// Placeholder city when reverse geocoding is unavailable.
pub const FALLBACK_CITY: &str = "未知城市";

/// Placeholder country when reverse geocoding is unavailable.
pub const FALLBACK_COUNTRY: &str = "中国";

/// Address shown when no coordinates could be resolved at all.
pub const UNKNOWN_ADDRESS: &str = "位置未知";

/// Fallback weather condition.
pub const FALLBACK_WEATHER_CONDITION: &str = "Clouds";

/// Fallback weather description.
pub const FALLBACK_WEATHER_DESCRIPTION: &str = "多云";

/// Fallback weather icon key.
pub const FALLBACK_WEATHER_ICON: &str = "02d";

/// Fallback temperature in degrees Celsius.
pub const FALLBACK_TEMPERATURE_C: f64 = 22.5;

// =============================================================================
// GENERATION (OpenAI-compatible chat completions)
// =============================================================================

/// Default chat completions base URL.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default text/vision model.
pub const GEN_MODEL: &str = "gpt-4o";

/// Generation request timeout in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 30;

/// Sampling temperature used for every generation request.
pub const GEN_TEMPERATURE: f32 = 1.1;

/// Nucleus sampling cutoff.
pub const GEN_TOP_P: f32 = 0.9;

/// Frequency penalty.
pub const GEN_FREQUENCY_PENALTY: f32 = 0.8;

/// Presence penalty.
pub const GEN_PRESENCE_PENALTY: f32 = 0.6;

/// Maximum completion tokens.
pub const GEN_MAX_TOKENS: u32 = 500;

/// Number of persona examples embedded in a prompt.
pub const FEW_SHOT_EXAMPLES: usize = 5;

// =============================================================================
// PROMPT CONTEXT PLACEHOLDERS
// =============================================================================

/// Time placeholder when no capture time is known.
pub const UNKNOWN_TIME: &str = "未知时间";

/// Place placeholder when no place is known.
pub const UNKNOWN_PLACE: &str = "未知地点";

/// Weather placeholder when no weather is known.
pub const NATURAL_WEATHER: &str = "自然天气";

/// Place hint that asks for persona-specific location text.
pub const CURRENT_LOCATION_HINT: &str = "当前位置";

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

/// Amap API key.
pub const ENV_AMAP_API_KEY: &str = "AMAP_API_KEY";
/// Amap base URL override.
pub const ENV_AMAP_BASE_URL: &str = "AMAP_BASE_URL";
/// Amap request timeout in seconds.
pub const ENV_AMAP_TIMEOUT: &str = "AMAP_TIMEOUT";
/// PEM file with an additional trusted CA for the Amap endpoint.
pub const ENV_AMAP_CA_CERT: &str = "AMAP_CA_CERT";
/// Administrative code used when city resolution fails.
pub const ENV_AMAP_DEFAULT_CITY_CODE: &str = "AMAP_DEFAULT_CITY_CODE";

/// Chat completions base URL.
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
/// Chat completions API key.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Generation model.
pub const ENV_OPENAI_GEN_MODEL: &str = "OPENAI_GEN_MODEL";
/// Generation timeout in seconds.
pub const ENV_OPENAI_TIMEOUT: &str = "OPENAI_TIMEOUT";
/// PEM file with an additional trusted CA for the generation endpoint.
pub const ENV_OPENAI_CA_CERT: &str = "OPENAI_CA_CERT";

/// Upload size limit override.
pub const ENV_MAX_IMAGE_BYTES: &str = "NIMBUS_MAX_IMAGE_BYTES";
/// Toggle for the second, name-anchored description request.
pub const ENV_DETAILED_DESCRIPTION: &str = "NIMBUS_DETAILED_DESCRIPTION";
/// Demo-mode default latitude.
pub const ENV_DEFAULT_LATITUDE: &str = "NIMBUS_DEFAULT_LATITUDE";
/// Demo-mode default longitude.
pub const ENV_DEFAULT_LONGITUDE: &str = "NIMBUS_DEFAULT_LONGITUDE";
/// Overall pipeline deadline in seconds.
pub const ENV_DEADLINE: &str = "NIMBUS_DEADLINE";

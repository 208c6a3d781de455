//! System-wide default constants.
//!
//! Centralises magic numbers used across the panel.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Session Protocol
// ============================================================================

/// Literal token a judge emits to end its session.
pub const TERMINATION_TOKEN: &str = "TERMINATE";

/// Agent turns per session (judge and collaborator alternate).
pub const MAX_TURNS: usize = 6;

/// Wall-clock budget for a single session (seconds).
pub const SESSION_DEADLINE_SECS: u64 = 300;

/// Longest accepted session deadline (seconds).
pub const MAX_SESSION_DEADLINE_SECS: u64 = 86_400;

// ============================================================================
// Scoring
// ============================================================================

/// Floor on the reference range span, avoids division by zero on degenerate sets.
pub const RANGE_EPSILON: f64 = 0.0001;

/// Minimum landmark visibility for a joint to count in a metric.
pub const MIN_LANDMARK_VISIBILITY: f64 = 0.3;

// ============================================================================
// Result Extraction
// ============================================================================

/// Characters of offending judge output kept in a failure verdict.
pub const FAILURE_SNIPPET_CHARS: usize = 200;

/// Opening braces tried by the brace scan, nearest to the final `}` first.
pub const MAX_BRACE_CANDIDATES: usize = 64;

// ============================================================================
// Paths
// ============================================================================

/// User clip artifact.
pub const USER_CLIP_PATH: &str = "landmarks.json";

/// Directory of persona reference clips.
pub const REFERENCE_DIR: &str = "reference";

/// Preference weights store.
pub const PREFERENCES_PATH: &str = "preferences.json";

// ============================================================================
// Hosted Models
// ============================================================================

/// OpenAI-compatible endpoint root.
pub const MODEL_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model for hosted judges.
pub const MODEL_NAME: &str = "gpt-4o-mini";

/// Environment variable holding the API key.
pub const MODEL_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// HTTP timeout for a single chat completion (seconds).
pub const MODEL_HTTP_TIMEOUT_SECS: u64 = 120;

// ============================================================================
// Synthetic References
// ============================================================================

/// Frames per generated reference clip.
pub const SYNTHETIC_FRAMES: usize = 30;

/// Uniform jitter applied around the base pose.
pub const SYNTHETIC_JITTER: f64 = 0.01;

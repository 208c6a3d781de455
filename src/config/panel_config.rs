//! Panel Configuration - session budget, paths, hosted model and judge roster
//!
//! Every field has a serde default, so an empty or partial TOML file is valid
//! and anything not set falls back to the constants in `config::defaults`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;
use crate::scoring::Metric;
use crate::types::JudgeProfile;

/// Environment variable pointing at a TOML config file.
pub const CONFIG_ENV_VAR: &str = "AURA_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "panel_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one panel deployment.
///
/// Load with `PanelConfig::load()` which searches:
/// 1. `$AURA_CONFIG` env var
/// 2. `./panel_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub model: ModelConfig,

    /// Judge roster, dispatched together on every evaluation.
    #[serde(default = "default_judges")]
    pub judges: Vec<JudgeProfile>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            paths: PathsConfig::default(),
            model: ModelConfig::default(),
            judges: default_judges(),
        }
    }
}

fn default_judges() -> Vec<JudgeProfile> {
    vec![
        JudgeProfile::new("Judge_Steve_Jobs", "Steve Jobs").with_metric("index_finger_gap"),
        JudgeProfile::new("Judge_Donald_Trump", "Donald Trump").with_metric("hand_spread"),
    ]
}

impl PanelConfig {
    /// Load configuration using the standard search order.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), judges = config.judges.len(), "Loaded panel config from AURA_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from AURA_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "AURA_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(judges = config.judges.len(), "Loaded panel config from ./panel_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./panel_config.toml, using defaults");
                }
            }
        }

        info!("No panel_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate the whole config, collecting every problem before failing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let s = &self.session;
        if s.max_turns == 0 {
            errors.push("session.max_turns must be > 0".to_string());
        } else if s.max_turns < 3 {
            warn!(
                max_turns = s.max_turns,
                "session.max_turns < 3 leaves no room for instruction, result and verdict"
            );
        }
        if s.termination_token.trim().is_empty() {
            errors.push("session.termination_token must not be empty".to_string());
        }
        if s.deadline_secs == 0 {
            errors.push("session.deadline_secs must be > 0".to_string());
        } else if s.deadline_secs > defaults::MAX_SESSION_DEADLINE_SECS {
            errors.push(format!(
                "session.deadline_secs must be <= {}, got {}",
                defaults::MAX_SESSION_DEADLINE_SECS,
                s.deadline_secs
            ));
        }

        let m = &self.model;
        if !m.temperature.is_finite() || !(0.0..=2.0).contains(&m.temperature) {
            errors.push(format!("model.temperature must be within [0, 2], got {}", m.temperature));
        }
        if m.timeout_secs == 0 {
            errors.push("model.timeout_secs must be > 0".to_string());
        }
        if m.base_url.trim().is_empty() {
            errors.push("model.base_url must not be empty".to_string());
        }

        if self.judges.is_empty() {
            errors.push("judges: at least one judge is required".to_string());
        }
        let mut seen = HashSet::new();
        for judge in &self.judges {
            if judge.id.trim().is_empty() {
                errors.push("judges: every judge needs a non-empty id".to_string());
                continue;
            }
            if judge.label.trim().is_empty() {
                errors.push(format!("judges.{}: label must not be empty", judge.id));
            }
            if !seen.insert(judge.id.as_str()) {
                errors.push(format!("judges.{}: duplicate judge id", judge.id));
            }
            if let Some(metric) = &judge.metric {
                if Metric::from_name(metric).is_none() {
                    errors.push(format!("judges.{}: unknown metric '{}'", judge.id, metric));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Judges restricted to the given ids, in roster order. Empty filter keeps all.
    pub fn select_judges(&self, ids: &[String]) -> Vec<JudgeProfile> {
        if ids.is_empty() {
            return self.judges.clone();
        }
        self.judges
            .iter()
            .filter(|j| ids.iter().any(|id| id == &j.id))
            .cloned()
            .collect()
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Session
// ============================================================================

/// Evaluation session protocol limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Agent turns per session.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Sentinel that ends a session.
    #[serde(default = "default_termination_token")]
    pub termination_token: String,

    /// Per-session wall-clock budget (seconds).
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

fn default_max_turns() -> usize { defaults::MAX_TURNS }
fn default_termination_token() -> String { defaults::TERMINATION_TOKEN.to_string() }
fn default_deadline_secs() -> u64 { defaults::SESSION_DEADLINE_SECS }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            termination_token: default_termination_token(),
            deadline_secs: default_deadline_secs(),
        }
    }
}

impl SessionConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

// ============================================================================
// Paths
// ============================================================================

/// Filesystem locations of the input artifacts and the preference store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_user_clip")]
    pub user_clip: PathBuf,

    #[serde(default = "default_reference_dir")]
    pub reference_dir: PathBuf,

    #[serde(default = "default_preferences")]
    pub preferences: PathBuf,
}

fn default_user_clip() -> PathBuf { PathBuf::from(defaults::USER_CLIP_PATH) }
fn default_reference_dir() -> PathBuf { PathBuf::from(defaults::REFERENCE_DIR) }
fn default_preferences() -> PathBuf { PathBuf::from(defaults::PREFERENCES_PATH) }

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            user_clip: default_user_clip(),
            reference_dir: default_reference_dir(),
            preferences: default_preferences(),
        }
    }
}

// ============================================================================
// Hosted Model
// ============================================================================

/// OpenAI-compatible backend for hosted judges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Agent definition JSON shared by every hosted judge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_definition: Option<PathBuf>,
}

fn default_base_url() -> String { defaults::MODEL_BASE_URL.to_string() }
fn default_model() -> String { defaults::MODEL_NAME.to_string() }
fn default_api_key_env() -> String { defaults::MODEL_API_KEY_ENV.to_string() }
fn default_temperature() -> f64 { 0.2 }
fn default_timeout_secs() -> u64 { defaults::MODEL_HTTP_TIMEOUT_SECS }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            judge_definition: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Agent definitions
//!
//! Model-backed judges are described by a JSON document:
//!
//! ```json
//! { "config": {
//!     "name": "Judge",
//!     "description": "Persona judge",
//!     "system_message": "You are {id}, evaluating as {label} would...",
//!     "model_client": { "config": { "model": "gpt-4o-mini", "api_key": "...", "base_url": "..." } }
//! } }
//! ```
//!
//! One definition is shared by every judge; `{label}` and `{id}` in the
//! system message are filled per judge. Missing model settings fall back to
//! the panel configuration, and the API key to the configured environment
//! variable.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use super::openai::{ChatModelSettings, OpenAiChatAgent};
use crate::config::ModelConfig;
use crate::session::AgentError;
use crate::types::JudgeProfile;

const DEFAULT_JUDGE_PROMPT: &str = "You are {id}, an expert on how {label} uses body language on stage. \
Judge the speaker strictly by {label}'s standards. Ask the Engineer for one metric, wait for the numbers, \
then answer with a single JSON verdict as instructed.";

#[derive(Debug, Clone, Deserialize)]
pub struct AgentDefinition {
    pub config: AgentSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system_message: String,
    #[serde(default)]
    pub model_client: ModelClientSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelClientSpec {
    #[serde(default)]
    pub config: ModelClientConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelClientConfig {
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f64>,
}

impl AgentDefinition {
    pub fn load(path: &Path) -> Result<Self, AgentError> {
        let definition_error = |reason: String| AgentError::Definition {
            path: path.display().to_string(),
            reason,
        };
        let contents = std::fs::read_to_string(path).map_err(|e| definition_error(e.to_string()))?;
        let def: Self = serde_json::from_str(&contents).map_err(|e| definition_error(e.to_string()))?;
        info!(path = %path.display(), name = %def.config.name, "Loaded agent definition");
        Ok(def)
    }

    /// Built-in judge definition used when none is configured.
    pub fn default_judge() -> Self {
        Self {
            config: AgentSpec {
                name: "Judge".to_string(),
                description: "Persona body-language judge".to_string(),
                system_message: DEFAULT_JUDGE_PROMPT.to_string(),
                model_client: ModelClientSpec::default(),
            },
        }
    }

    /// System message with the judge's placeholders filled.
    pub fn system_message_for(&self, judge: &JudgeProfile) -> String {
        self.config
            .system_message
            .replace("{label}", &judge.label)
            .replace("{id}", &judge.id)
    }

    /// Resolve model settings against the panel configuration.
    pub fn settings(&self, model: &ModelConfig) -> Result<ChatModelSettings, AgentError> {
        let client = &self.config.model_client.config;
        let api_key = client
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&model.api_key_env).ok().filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| AgentError::MissingApiKey(model.api_key_env.clone()))?;

        Ok(ChatModelSettings {
            base_url: client.base_url.clone().unwrap_or_else(|| model.base_url.clone()),
            model: client.model.clone().unwrap_or_else(|| model.model.clone()),
            api_key,
            temperature: client.temperature.unwrap_or(model.temperature),
            timeout: Duration::from_secs(model.timeout_secs),
        })
    }

    /// Instantiate the definition as a named judge.
    pub fn build_judge(&self, judge: &JudgeProfile, model: &ModelConfig) -> Result<OpenAiChatAgent, AgentError> {
        OpenAiChatAgent::new(judge.id.clone(), self.system_message_for(judge), self.settings(model)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_and_fill_placeholders() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"config": {{"name": "Judge", "system_message": "You are {{id}} judging as {{label}}.",
                "model_client": {{"config": {{"model": "gpt-test", "api_key": "sk-test"}}}}}}}}"#
        )
        .unwrap();

        let def = AgentDefinition::load(file.path()).unwrap();
        let judge = JudgeProfile::new("Judge_Steve_Jobs", "Steve Jobs");
        assert_eq!(def.system_message_for(&judge), "You are Judge_Steve_Jobs judging as Steve Jobs.");

        let settings = def.settings(&ModelConfig::default()).unwrap();
        assert_eq!(settings.model, "gpt-test");
        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.base_url, ModelConfig::default().base_url);
    }

    #[test]
    fn test_missing_key_is_reported() {
        let model = ModelConfig {
            api_key_env: "AURA_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ModelConfig::default()
        };
        let err = AgentDefinition::default_judge().settings(&model).unwrap_err();
        assert!(matches!(err, AgentError::MissingApiKey(ref var) if var == "AURA_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_invalid_definition() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"config": {{}}}}"#).unwrap();
        assert!(matches!(AgentDefinition::load(file.path()), Err(AgentError::Definition { .. })));
    }
}

//! OpenAI-compatible chat agent
//!
//! Backs a session role with `POST {base_url}/chat/completions`. The
//! transcript is replayed on every turn: this agent's own messages become
//! `assistant` messages, everything else is a `user` message prefixed with
//! its source.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::session::{AgentError, ChatAgent, ChatMessage, ChatRole, TurnContext};

/// Connection settings for one model-backed agent.
#[derive(Debug, Clone)]
pub struct ChatModelSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f64,
    pub timeout: Duration,
}

#[derive(Debug)]
pub struct OpenAiChatAgent {
    name: String,
    system_message: String,
    settings: ChatModelSettings,
    http: reqwest::Client,
}

impl OpenAiChatAgent {
    pub fn new(
        name: impl Into<String>,
        system_message: impl Into<String>,
        settings: ChatModelSettings,
    ) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            name: name.into(),
            system_message: system_message.into(),
            settings,
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'))
    }

    /// Chat messages for the request body.
    fn messages(&self, transcript: &[ChatMessage]) -> Vec<Value> {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        if !self.system_message.is_empty() {
            messages.push(json!({"role": "system", "content": self.system_message}));
        }
        for msg in transcript {
            if msg.source == self.name {
                messages.push(json!({"role": "assistant", "content": msg.content}));
            } else if msg.role == ChatRole::Task {
                messages.push(json!({"role": "user", "content": msg.content}));
            } else {
                messages.push(json!({
                    "role": "user",
                    "content": format!("{}: {}", msg.source, msg.content),
                }));
            }
        }
        messages
    }
}

#[async_trait]
impl ChatAgent for OpenAiChatAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(
        &self,
        ctx: &TurnContext<'_>,
        transcript: &[ChatMessage],
    ) -> Result<String, AgentError> {
        let body = json!({
            "model": self.settings.model,
            "messages": self.messages(transcript),
            "temperature": self.settings.temperature,
        });

        debug!(agent = %self.name, turn = ctx.turn, phase = %ctx.phase, "Requesting completion");
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentError::Api { status: status.as_u16(), body });
        }

        let json: Value = resp.json().await?;
        json.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(AgentError::EmptyResponse)
    }
}

//! Conversation participants
//!
//! Both session roles implement [`ChatAgent`]: given the turn context and the
//! transcript so far, produce the next message. Implementations may call a
//! hosted model, compute metrics locally or replay a script.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::phase::SessionPhase;
use crate::types::JudgeProfile;

/// Who produced a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    /// The task script that opens the session. Never counts as an agent turn.
    Task,
    Judge,
    Collaborator,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Agent name, or `user` for the task script.
    pub source: String,
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn task(content: impl Into<String>) -> Self {
        Self { source: "user".to_string(), role: ChatRole::Task, content: content.into() }
    }

    pub fn new(source: impl Into<String>, role: ChatRole, content: impl Into<String>) -> Self {
        Self { source: source.into(), role, content: content.into() }
    }
}

/// What an agent knows about the turn it is asked to take.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    pub judge: &'a JudgeProfile,
    pub phase: SessionPhase,
    /// Zero-based agent turn index.
    pub turn: usize,
    pub role: ChatRole,
}

/// Agent errors
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model API returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("model response carried no message content")]
    EmptyResponse,
    #[error("no API key: set {0} or provide one in the agent definition")]
    MissingApiKey(String),
    #[error("agent definition error ({path}): {reason}")]
    Definition { path: String, reason: String },
    #[error("{0}")]
    Failed(String),
}

/// A session participant.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    /// Name shown as the message source.
    fn name(&self) -> &str;

    /// Produce the next message.
    async fn respond(
        &self,
        ctx: &TurnContext<'_>,
        transcript: &[ChatMessage],
    ) -> Result<String, AgentError>;
}

/// Content of the most recent message from `role`.
pub fn last_from(transcript: &[ChatMessage], role: ChatRole) -> Option<&str> {
    transcript
        .iter()
        .rev()
        .find(|m| m.role == role)
        .map(|m| m.content.as_str())
}

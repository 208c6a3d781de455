//! Metric Engineer
//!
//! The built-in collaborator. It reads the judge's latest instruction, picks
//! the catalog metric it names and answers with the analysis record as JSON.
//! Clips are loaded before the session starts, so every turn is pure compute.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::scoring::{catalog, run_analysis, Metric};
use crate::session::{last_from, AgentError, ChatAgent, ChatMessage, ChatRole, TurnContext};
use crate::types::Clip;

pub const ENGINEER_NAME: &str = "Engineer";

/// Collaborator computing catalog metrics over one judge's data.
pub struct MetricEngineer {
    user: Arc<Clip>,
    references: Vec<Clip>,
}

impl MetricEngineer {
    /// `user` is shared across all sessions of a run; `references` belong to one judge.
    pub fn new(user: Arc<Clip>, references: Vec<Clip>) -> Self {
        Self { user, references }
    }
}

/// First catalog metric named in `text`, by position. Underscores may be
/// written as spaces or hyphens.
pub fn requested_metric(text: &str) -> Option<Metric> {
    let lower = text.to_lowercase();
    Metric::all()
        .iter()
        .filter_map(|metric| {
            let name = metric.name();
            [name.to_string(), name.replace('_', " "), name.replace('_', "-")]
                .iter()
                .filter_map(|variant| lower.find(variant.as_str()))
                .min()
                .map(|pos| (pos, *metric))
        })
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, metric)| metric)
}

#[async_trait]
impl ChatAgent for MetricEngineer {
    fn name(&self) -> &str {
        ENGINEER_NAME
    }

    async fn respond(
        &self,
        ctx: &TurnContext<'_>,
        transcript: &[ChatMessage],
    ) -> Result<String, AgentError> {
        let instruction = last_from(transcript, ChatRole::Judge).unwrap_or_default();

        let Some(metric) = requested_metric(instruction) else {
            warn!(judge = %ctx.judge.id, "Instruction names no catalog metric");
            let reply = json!({
                "error": "Unknown Metric",
                "description": format!("Name one of the available metrics:\n{}", catalog()),
            });
            return Ok(reply.to_string());
        };

        debug!(judge = %ctx.judge.id, metric = %metric, "Engineer computing metric");
        let outcome = run_analysis(&ctx.judge.id, metric, &self.user, &self.references);
        Ok(outcome.to_json())
    }
}

//! Panel assembly
//!
//! Wires the pieces into one evaluation run: load the user clip once, build a
//! metric engineer per judge over that judge's reference clips, pair it with
//! the configured judge backend, dispatch, and rank with the stored weights.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::agents::{AgentDefinition, MetricEngineer, RubricJudge};
use crate::clip::{load_clip, load_reference_clips};
use crate::config::{ModelConfig, PanelConfig};
use crate::dispatch::{Dispatcher, SessionAgents, SessionFactory};
use crate::session::{AgentError, ChatAgent, SessionRunner};
use crate::storage::{PreferenceStore, PreferenceWeights};
use crate::types::{AggregatedReport, Clip, JudgeProfile};

/// What plays the judge role.
#[derive(Debug, Clone)]
pub enum JudgeBackend {
    /// Deterministic rubric judge, no network.
    Rubric,
    /// Hosted chat model from an agent definition.
    Model {
        definition: AgentDefinition,
        model: ModelConfig,
    },
}

impl JudgeBackend {
    /// Model backend from configuration: the configured definition file, or
    /// the built-in judge definition.
    pub fn from_config(model: &ModelConfig) -> Result<Self, AgentError> {
        let definition = match &model.judge_definition {
            Some(path) => AgentDefinition::load(path)?,
            None => AgentDefinition::default_judge(),
        };
        Ok(JudgeBackend::Model { definition, model: model.clone() })
    }
}

/// Builds a judge and a metric engineer for each session.
pub struct PanelSessionFactory {
    user: Arc<Clip>,
    reference_dir: PathBuf,
    backend: JudgeBackend,
    termination_token: String,
}

impl PanelSessionFactory {
    pub fn new(
        user: Arc<Clip>,
        reference_dir: impl Into<PathBuf>,
        backend: JudgeBackend,
        termination_token: impl Into<String>,
    ) -> Self {
        Self {
            user,
            reference_dir: reference_dir.into(),
            backend,
            termination_token: termination_token.into(),
        }
    }
}

#[async_trait]
impl SessionFactory for PanelSessionFactory {
    async fn build(&self, judge: &JudgeProfile) -> Result<SessionAgents, AgentError> {
        let dir = self.reference_dir.clone();
        let profile = judge.clone();
        let references = tokio::task::spawn_blocking(move || load_reference_clips(&dir, &profile))
            .await
            .map_err(|e| AgentError::Failed(format!("reference loading aborted: {e}")))?;

        let collaborator: Box<dyn ChatAgent> = Box::new(MetricEngineer::new(Arc::clone(&self.user), references));
        let judge_agent: Box<dyn ChatAgent> = match &self.backend {
            JudgeBackend::Rubric => Box::new(RubricJudge::new(judge, self.termination_token.clone())),
            JudgeBackend::Model { definition, model } => Box::new(definition.build_judge(judge, model)?),
        };

        Ok(SessionAgents { judge: judge_agent, collaborator })
    }
}

/// Options for one evaluation run, already resolved against configuration.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub user_clip: PathBuf,
    pub reference_dir: PathBuf,
    pub preferences: PathBuf,
    pub judges: Vec<JudgeProfile>,
    pub backend: JudgeBackend,
}

impl EvaluationRequest {
    /// Request using every configured path and judge.
    pub fn from_config(config: &PanelConfig, backend: JudgeBackend) -> Self {
        Self {
            user_clip: config.paths.user_clip.clone(),
            reference_dir: config.paths.reference_dir.clone(),
            preferences: config.paths.preferences.clone(),
            judges: config.judges.clone(),
            backend,
        }
    }
}

/// Run the whole panel.
pub async fn evaluate(
    config: &PanelConfig,
    request: EvaluationRequest,
    cancel: CancellationToken,
) -> AggregatedReport {
    let user_path = request.user_clip.clone();
    let user = tokio::task::spawn_blocking(move || load_clip(&user_path))
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "User clip loading aborted");
            Vec::new()
        });
    info!(path = %request.user_clip.display(), frames = user.len(), "User clip loaded");

    // Scoped read: weights are copied out before any session starts.
    let weights = match PreferenceStore::new(&request.preferences).load() {
        Ok(w) => w,
        Err(e) => {
            warn!(error = %e, "Preference store unreadable, using default weights");
            PreferenceWeights::new()
        }
    };

    let factory = PanelSessionFactory::new(
        Arc::new(user),
        request.reference_dir,
        request.backend,
        config.session.termination_token.clone(),
    );
    let dispatcher = Dispatcher::new(SessionRunner::from_config(&config.session), Arc::new(factory))
        .with_cancellation(cancel);

    dispatcher.run(&request.judges, &weights).await
}

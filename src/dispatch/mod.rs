//! Dispatcher
//!
//! Runs one session per judge concurrently on a [`JoinSet`], extracts each
//! session's verdict and hands the collected verdicts to [`aggregate`].
//! Sessions share nothing: each gets its own agents, transcript and child
//! cancellation token. Whatever goes wrong inside a session (agent
//! construction, an agent error, a panic) becomes that judge's failure
//! verdict; the run itself never fails.

pub mod aggregate;

pub use aggregate::aggregate;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::extract::{extract, Extraction};
use crate::session::{task_script, AgentError, ChatAgent, SessionRunner};
use crate::storage::PreferenceWeights;
use crate::types::{AggregatedReport, JudgeProfile, Verdict};

/// Judge and collaborator for one session.
pub struct SessionAgents {
    pub judge: Box<dyn ChatAgent>,
    pub collaborator: Box<dyn ChatAgent>,
}

/// Builds fresh agents for each session.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn build(&self, judge: &JudgeProfile) -> Result<SessionAgents, AgentError>;
}

pub struct Dispatcher {
    runner: SessionRunner,
    factory: Arc<dyn SessionFactory>,
    cancel: CancellationToken,
}

impl Dispatcher {
    pub fn new(runner: SessionRunner, factory: Arc<dyn SessionFactory>) -> Self {
        Self { runner, factory, cancel: CancellationToken::new() }
    }

    /// Use an external token, e.g. one cancelled on Ctrl+C.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run every judge's session and collect the verdicts, keyed by judge id.
    pub async fn collect(&self, judges: &[JudgeProfile]) -> HashMap<String, Verdict> {
        info!(judges = judges.len(), "Dispatching judge sessions");

        let mut set = JoinSet::new();
        for judge in judges {
            let judge = judge.clone();
            let runner = self.runner.clone();
            let factory = Arc::clone(&self.factory);
            let cancel = self.cancel.child_token();
            set.spawn(async move {
                let verdict = run_session(&runner, factory.as_ref(), &judge, &cancel).await;
                (judge.id, verdict)
            });
        }

        let mut verdicts = HashMap::with_capacity(judges.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((id, verdict)) => {
                    verdicts.insert(id, verdict);
                }
                Err(e) => warn!(error = %e, "Judge session task aborted"),
            }
        }

        for judge in judges {
            verdicts
                .entry(judge.id.clone())
                .or_insert_with(|| Verdict::failure(&judge.id, "Session task did not complete"));
        }
        info!(collected = verdicts.len(), "Judge sessions complete");
        verdicts
    }

    /// Run the panel and produce the ranked report.
    pub async fn run(&self, judges: &[JudgeProfile], weights: &PreferenceWeights) -> AggregatedReport {
        let verdicts = self.collect(judges).await;
        aggregate(verdicts, weights, judges)
    }
}

/// One judge's session, reduced to a verdict.
async fn run_session(
    runner: &SessionRunner,
    factory: &dyn SessionFactory,
    judge: &JudgeProfile,
    cancel: &CancellationToken,
) -> Verdict {
    let agents = match factory.build(judge).await {
        Ok(agents) => agents,
        Err(e) => {
            warn!(judge = %judge.id, error = %e, "Could not build session agents");
            return Verdict::failure(&judge.id, format!("Session setup failed: {e}"));
        }
    };

    let task = task_script(judge, runner.termination_token());
    let outcome = match runner
        .run(agents.judge.as_ref(), agents.collaborator.as_ref(), judge, task, cancel)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(judge = %judge.id, error = %e, "Session failed");
            return Verdict::failure(&judge.id, format!("Session failed: {e}"));
        }
    };

    match extract(outcome.final_text, &judge.id) {
        Extraction::Parsed { verdict, strategy } => {
            info!(judge = %judge.id, %strategy, severity = verdict.severity, "Verdict recovered");
            verdict
        }
        Extraction::Fallback { verdict } => verdict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ChatMessage, TurnContext};
    use std::time::Duration;

    struct Fixed(String, String);

    #[async_trait]
    impl ChatAgent for Fixed {
        fn name(&self) -> &str {
            &self.0
        }

        async fn respond(&self, _ctx: &TurnContext<'_>, _t: &[ChatMessage]) -> Result<String, AgentError> {
            Ok(self.1.clone())
        }
    }

    struct Broken;

    #[async_trait]
    impl ChatAgent for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn respond(&self, _ctx: &TurnContext<'_>, _t: &[ChatMessage]) -> Result<String, AgentError> {
            Err(AgentError::Failed("boom".into()))
        }
    }

    /// Judges reply with their severity; `Judge_Bad` fails; `Judge_Panic` panics during setup.
    struct TestFactory;

    #[async_trait]
    impl SessionFactory for TestFactory {
        async fn build(&self, judge: &JudgeProfile) -> Result<SessionAgents, AgentError> {
            let collaborator: Box<dyn ChatAgent> = Box::new(Fixed("Engineer".into(), "{}".into()));
            let judge_agent: Box<dyn ChatAgent> = match judge.id.as_str() {
                "Judge_Bad" => Box::new(Broken),
                "Judge_Panic" => panic!("factory exploded"),
                id => {
                    let severity = judge.label.parse::<f64>().unwrap_or(0.0);
                    Box::new(Fixed(
                        id.to_string(),
                        format!(r#"{{"metric_analyzed": "m", "severity": {severity}, "description": "d"}} TERMINATE"#),
                    ))
                }
            };
            Ok(SessionAgents { judge: judge_agent, collaborator })
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(SessionRunner::new(6, "TERMINATE", Duration::from_secs(10)), Arc::new(TestFactory))
    }

    #[tokio::test]
    async fn test_every_judge_gets_a_verdict() {
        let judges = vec![
            JudgeProfile::new("Judge_One", "0.3"),
            JudgeProfile::new("Judge_Bad", "x"),
            JudgeProfile::new("Judge_Two", "0.8"),
            JudgeProfile::new("Judge_Panic", "x"),
        ];
        let verdicts = dispatcher().collect(&judges).await;
        assert_eq!(verdicts.len(), 4);
        assert!(verdicts["Judge_Bad"].is_failure());
        assert!(verdicts["Judge_Panic"].is_failure());
        assert_eq!(verdicts["Judge_Two"].severity, 0.8);
        assert_eq!(verdicts["Judge_One"].judge, "Judge_One");
    }

    #[tokio::test]
    async fn test_unbounded_deadline_still_runs_sessions() {
        let runner = SessionRunner::new(6, "TERMINATE", Duration::from_secs(u64::MAX));
        let dispatcher = Dispatcher::new(runner, Arc::new(TestFactory));
        let judges = vec![JudgeProfile::new("Judge_One", "0.3"), JudgeProfile::new("Judge_Two", "0.8")];
        let verdicts = dispatcher.collect(&judges).await;
        assert!(verdicts.values().all(|v| !v.is_failure()));
        assert_eq!(verdicts["Judge_Two"].severity, 0.8);
    }

    #[tokio::test]
    async fn test_report_ranks_by_weighted_severity() {
        let judges = vec![JudgeProfile::new("Judge_A", "0.2"), JudgeProfile::new("Judge_B", "0.5")];
        let weights = PreferenceWeights::new().with("Judge_A", 3.0);
        let report = dispatcher().run(&judges, &weights).await;
        assert_eq!(report.judges(), vec!["Judge_A", "Judge_B"]);
        assert_eq!(report.failures(), 0);
    }
}

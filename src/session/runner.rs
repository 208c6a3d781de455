//! Session runner
//!
//! Drives one judge and one collaborator through a bounded round-robin
//! conversation. The judge always speaks first. The session stops on the
//! earliest of: the sentinel in an agent message, the turn budget, the
//! deadline, or cancellation. Only an agent error fails the session; every
//! other ending returns the best-effort judge message.

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::agent::{AgentError, ChatAgent, ChatMessage, ChatRole, TurnContext};
use super::phase::{PhaseEvent, SessionPhase};
use crate::config::SessionConfig;
use crate::types::JudgeProfile;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    Sentinel,
    TurnBudget,
    Deadline,
    Cancelled,
}

impl TerminationReason {
    fn event(self) -> PhaseEvent {
        match self {
            TerminationReason::Sentinel => PhaseEvent::SentinelSeen,
            TerminationReason::TurnBudget => PhaseEvent::BudgetExhausted,
            TerminationReason::Deadline => PhaseEvent::DeadlineReached,
            TerminationReason::Cancelled => PhaseEvent::Cancelled,
        }
    }
}

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("agent '{agent}' failed on turn {turn}: {source}")]
    Agent {
        agent: String,
        turn: usize,
        #[source]
        source: AgentError,
    },
}

/// Everything a finished session produced.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub judge: String,
    pub transcript: Vec<ChatMessage>,
    pub reason: TerminationReason,
    /// Agent turns taken.
    pub turns: usize,
    pub final_phase: SessionPhase,
    /// Last judge message with the sentinel removed; empty if the judge never spoke.
    pub final_text: String,
}

/// Protocol limits for one session.
#[derive(Debug, Clone)]
pub struct SessionRunner {
    max_turns: usize,
    termination_token: String,
    deadline: Duration,
}

impl SessionRunner {
    pub fn new(max_turns: usize, termination_token: impl Into<String>, deadline: Duration) -> Self {
        Self { max_turns, termination_token: termination_token.into(), deadline }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.max_turns, config.termination_token.clone(), config.deadline())
    }

    pub fn termination_token(&self) -> &str {
        &self.termination_token
    }

    /// Run one session to termination.
    pub async fn run(
        &self,
        judge: &dyn ChatAgent,
        collaborator: &dyn ChatAgent,
        profile: &JudgeProfile,
        task: String,
        cancel: &CancellationToken,
    ) -> Result<SessionOutcome, SessionError> {
        // A deadline past the clock's range means no deadline at all.
        let deadline = Instant::now().checked_add(self.deadline);
        let mut transcript = vec![ChatMessage::task(task)];
        let mut phase = SessionPhase::Research;
        let mut turns = 0usize;

        info!(judge = %profile.id, max_turns = self.max_turns, "Session started");

        let reason = loop {
            if turns >= self.max_turns {
                break TerminationReason::TurnBudget;
            }

            let (speaker, role) = if turns % 2 == 0 {
                (judge, ChatRole::Judge)
            } else {
                (collaborator, ChatRole::Collaborator)
            };
            let ctx = TurnContext { judge: profile, phase, turn: turns, role };

            let reply = tokio::select! {
                biased;
                _ = cancel.cancelled() => break TerminationReason::Cancelled,
                _ = wait_until(deadline) => break TerminationReason::Deadline,
                result = speaker.respond(&ctx, &transcript) => {
                    result.map_err(|source| SessionError::Agent {
                        agent: speaker.name().to_string(),
                        turn: turns,
                        source,
                    })?
                }
            };

            turns += 1;
            let sentinel = reply.contains(&self.termination_token);
            transcript.push(ChatMessage::new(speaker.name(), role, reply));

            let event = match role {
                ChatRole::Collaborator => PhaseEvent::CollaboratorSpoke,
                _ => PhaseEvent::JudgeSpoke,
            };
            let next = phase.next(event);
            if next != phase {
                debug!(judge = %profile.id, from = %phase, to = %next, turn = turns, "Phase transition");
            }
            phase = next;

            if sentinel {
                break TerminationReason::Sentinel;
            }
        };

        phase = phase.next(reason.event());
        let final_text = self.final_judge_text(&transcript);

        match reason {
            TerminationReason::Sentinel | TerminationReason::TurnBudget => {
                info!(judge = %profile.id, ?reason, turns, "Session finished")
            }
            TerminationReason::Deadline | TerminationReason::Cancelled => {
                warn!(judge = %profile.id, ?reason, turns, "Session cut short, using best-effort result")
            }
        }

        Ok(SessionOutcome {
            judge: profile.id.clone(),
            transcript,
            reason,
            turns,
            final_phase: phase,
            final_text,
        })
    }

    fn final_judge_text(&self, transcript: &[ChatMessage]) -> String {
        transcript
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::Judge)
            .map(|m| m.content.replace(&self.termination_token, "").trim().to_string())
            .unwrap_or_default()
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replies from a fixed script, repeating the last line once exhausted.
    struct Scripted {
        name: String,
        lines: Vec<String>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(name: &str, lines: &[&str]) -> Self {
            Self {
                name: name.to_string(),
                lines: lines.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChatAgent for Scripted {
        fn name(&self) -> &str {
            &self.name
        }

        async fn respond(&self, _ctx: &TurnContext<'_>, _t: &[ChatMessage]) -> Result<String, AgentError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let line = self.lines.get(n).or_else(|| self.lines.last());
            Ok(line.cloned().unwrap_or_default())
        }
    }

    struct Failing;

    #[async_trait]
    impl ChatAgent for Failing {
        fn name(&self) -> &str {
            "broken"
        }

        async fn respond(&self, _ctx: &TurnContext<'_>, _t: &[ChatMessage]) -> Result<String, AgentError> {
            Err(AgentError::Failed("model unavailable".into()))
        }
    }

    struct Stalling;

    #[async_trait]
    impl ChatAgent for Stalling {
        fn name(&self) -> &str {
            "stalling"
        }

        async fn respond(&self, _ctx: &TurnContext<'_>, _t: &[ChatMessage]) -> Result<String, AgentError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    fn profile() -> JudgeProfile {
        JudgeProfile::new("Judge_A", "A")
    }

    fn runner(max_turns: usize) -> SessionRunner {
        SessionRunner::new(max_turns, "TERMINATE", Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_sentinel_ends_session() {
        let judge = Scripted::new("Judge_A", &["compute hand_spread", "{\"severity\": 0.2} TERMINATE"]);
        let engineer = Scripted::new("Engineer", &["{\"user_value\": 0.3}"]);
        let out = runner(6)
            .run(&judge, &engineer, &profile(), "task mentions TERMINATE".into(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out.reason, TerminationReason::Sentinel);
        assert_eq!(out.turns, 3);
        assert_eq!(out.final_text, "{\"severity\": 0.2}");
        assert_eq!(out.final_phase, SessionPhase::Terminated);
    }

    #[tokio::test]
    async fn test_sentinel_from_collaborator_returns_last_judge_message() {
        let judge = Scripted::new("Judge_A", &["compute hand_spread"]);
        let engineer = Scripted::new("Engineer", &["done TERMINATE"]);
        let out = runner(6)
            .run(&judge, &engineer, &profile(), "task".into(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out.reason, TerminationReason::Sentinel);
        assert_eq!(out.turns, 2);
        assert_eq!(out.final_text, "compute hand_spread");
    }

    #[tokio::test]
    async fn test_budget_exhausted_returns_last_judge_message() {
        let judge = Scripted::new("Judge_A", &["j1", "j2", "j3", "j4"]);
        let engineer = Scripted::new("Engineer", &["e1", "e2", "e3"]);
        let out = runner(6)
            .run(&judge, &engineer, &profile(), "task".into(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out.reason, TerminationReason::TurnBudget);
        assert_eq!(out.turns, 6);
        // judge speaks on turns 0, 2, 4
        assert_eq!(out.final_text, "j3");
        assert_eq!(out.transcript.len(), 7);
    }

    #[tokio::test]
    async fn test_zero_budget_yields_empty_text() {
        let judge = Scripted::new("Judge_A", &["never"]);
        let engineer = Scripted::new("Engineer", &["never"]);
        let out = runner(0)
            .run(&judge, &engineer, &profile(), "task".into(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out.final_text, "");
        assert_eq!(out.turns, 0);
    }

    #[tokio::test]
    async fn test_agent_error_fails_session() {
        let engineer = Scripted::new("Engineer", &["e1"]);
        let err = runner(6)
            .run(&Failing, &engineer, &profile(), "task".into(), &CancellationToken::new())
            .await
            .unwrap_err();
        let SessionError::Agent { agent, turn, .. } = err;
        assert_eq!(agent, "broken");
        assert_eq!(turn, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_degrades_to_best_effort() {
        let judge = Scripted::new("Judge_A", &["compute index_finger_gap"]);
        let runner = SessionRunner::new(6, "TERMINATE", Duration::from_secs(5));
        let out = runner
            .run(&judge, &Stalling, &profile(), "task".into(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out.reason, TerminationReason::Deadline);
        assert_eq!(out.final_text, "compute index_finger_gap");
    }

    #[tokio::test]
    async fn test_unbounded_deadline_runs_normally() {
        let judge = Scripted::new("Judge_A", &["compute hand_spread", "{\"severity\": 0.4} TERMINATE"]);
        let engineer = Scripted::new("Engineer", &["{\"user_value\": 0.3}"]);
        let runner = SessionRunner::new(6, "TERMINATE", Duration::from_secs(u64::MAX));
        let out = runner
            .run(&judge, &engineer, &profile(), "task".into(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out.reason, TerminationReason::Sentinel);
        assert_eq!(out.final_text, "{\"severity\": 0.4}");
    }

    #[tokio::test]
    async fn test_cancelled_session() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let judge = Scripted::new("Judge_A", &["j1"]);
        let engineer = Scripted::new("Engineer", &["e1"]);
        let out = runner(6)
            .run(&judge, &engineer, &profile(), "task".into(), &cancel)
            .await
            .unwrap();
        assert_eq!(out.reason, TerminationReason::Cancelled);
        assert_eq!(out.turns, 0);
    }
}

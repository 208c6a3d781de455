//! Offline rubric judge
//!
//! Follows the task script without a model: asks the engineer for the
//! judge's signature metric, then turns the returned analysis record into a
//! verdict in a fenced JSON block followed by the sentinel. An analysis error
//! produces a plain refusal, which extraction turns into a failure verdict.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::scoring::Metric;
use crate::session::{last_from, AgentError, ChatAgent, ChatMessage, ChatRole, TurnContext};
use crate::types::{JudgeProfile, SeverityBand};

/// Signature metric when a judge profile names none.
pub const DEFAULT_METRIC: Metric = Metric::HandSpread;

pub struct RubricJudge {
    name: String,
    label: String,
    metric: Metric,
    termination_token: String,
}

impl RubricJudge {
    pub fn new(profile: &JudgeProfile, termination_token: impl Into<String>) -> Self {
        let metric = profile
            .metric
            .as_deref()
            .and_then(Metric::from_name)
            .unwrap_or(DEFAULT_METRIC);
        Self {
            name: profile.id.clone(),
            label: profile.label.clone(),
            metric,
            termination_token: termination_token.into(),
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    fn instruction(&self) -> String {
        format!(
            "As {label}, the gesture I care about is {desc}. Engineer, compute {metric} for the \
             user clip and compare it with my reference recordings.",
            label = self.label,
            desc = self.metric.description(),
            metric = self.metric.name(),
        )
    }

    fn critique(&self, band: SeverityBand, record: &Value) -> String {
        let num = |key: &str| record.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        let (user, min, max) = (num("user_value"), num("ref_min"), num("ref_max"));

        if record.get("status").is_some() {
            return format!(
                "No reference recordings of {} were available, so {} cannot be matched.",
                self.label, self.metric
            );
        }

        let position = format!("{} is {user:.3} against a reference range of {min:.3}..{max:.3}", self.metric);
        match band {
            SeverityBand::Strength => format!("{position}. That is right in {}'s style.", self.label),
            SeverityBand::Pass => format!("{position}. Close to {}, with a little drift.", self.label),
            SeverityBand::Warning => {
                format!("{position}. This is clearly not how {} carries it.", self.label)
            }
            SeverityBand::Critical => {
                format!("{position}. Nothing like {}; rework this gesture first.", self.label)
            }
        }
    }

    fn verdict(&self, record: &Value) -> String {
        let Some(severity) = record.get("severity").and_then(Value::as_f64) else {
            let reason = record
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("the engineer returned no usable data");
            return format!("I could not evaluate {}: {reason}. {}", self.metric, self.termination_token);
        };

        let band = SeverityBand::from_severity(severity);
        let verdict = json!({
            "metric_analyzed": self.metric.name(),
            "severity": severity,
            "description": self.critique(band, record),
            "judge": self.name,
        });
        format!("```json\n{verdict}\n```\n{}", self.termination_token)
    }
}

#[async_trait]
impl ChatAgent for RubricJudge {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(
        &self,
        _ctx: &TurnContext<'_>,
        transcript: &[ChatMessage],
    ) -> Result<String, AgentError> {
        let Some(reply) = last_from(transcript, ChatRole::Collaborator) else {
            return Ok(self.instruction());
        };

        match serde_json::from_str::<Value>(reply) {
            Ok(record) => Ok(self.verdict(&record)),
            Err(_) => Ok(format!(
                "The engineer's reply was not a data record. {}",
                self.termination_token
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::session::SessionPhase;

    fn judge() -> RubricJudge {
        RubricJudge::new(
            &JudgeProfile::new("Judge_Steve_Jobs", "Steve Jobs").with_metric("index_finger_gap"),
            "TERMINATE",
        )
    }

    fn ctx(profile: &JudgeProfile) -> TurnContext<'_> {
        TurnContext { judge: profile, phase: SessionPhase::Research, turn: 0, role: ChatRole::Judge }
    }

    #[tokio::test]
    async fn test_first_turn_instructs_engineer() {
        let profile = JudgeProfile::new("Judge_Steve_Jobs", "Steve Jobs");
        let msg = judge().respond(&ctx(&profile), &[ChatMessage::task("task")]).await.unwrap();
        assert!(msg.contains("index_finger_gap"));
        assert!(!msg.contains("TERMINATE"));
    }

    #[tokio::test]
    async fn test_verdict_is_extractable() {
        let profile = JudgeProfile::new("Judge_Steve_Jobs", "Steve Jobs");
        let record = r#"{"metric_name":"index_finger_gap","user_value":0.4,"ref_min":0.03,"ref_max":0.05,"ref_mean":0.04,"ref_std":0.01,"samples":2,"severity":1.0,"band":"critical"}"#;
        let transcript = vec![
            ChatMessage::task("task"),
            ChatMessage::new("Judge_Steve_Jobs", ChatRole::Judge, "compute"),
            ChatMessage::new("Engineer", ChatRole::Collaborator, record),
        ];
        let msg = judge().respond(&ctx(&profile), &transcript).await.unwrap();
        assert!(msg.ends_with("TERMINATE"));

        let verdict = extract(msg.replace("TERMINATE", ""), "Judge_Steve_Jobs").into_verdict();
        assert_eq!(verdict.metric_analyzed, "index_finger_gap");
        assert_eq!(verdict.severity, 1.0);
        assert!(!verdict.is_failure());
    }

    #[tokio::test]
    async fn test_error_record_yields_no_verdict() {
        let profile = JudgeProfile::new("Judge_Steve_Jobs", "Steve Jobs");
        let transcript = vec![ChatMessage::new(
            "Engineer",
            ChatRole::Collaborator,
            r#"{"error":"No User Data","description":"empty clip"}"#,
        )];
        let msg = judge().respond(&ctx(&profile), &transcript).await.unwrap();
        assert!(extract(msg.as_str(), "Judge_Steve_Jobs").is_fallback());
    }

    #[test]
    fn test_unknown_metric_uses_default() {
        let j = RubricJudge::new(&JudgeProfile::new("J", "J").with_metric("aura"), "TERMINATE");
        assert_eq!(j.metric(), DEFAULT_METRIC);
    }
}

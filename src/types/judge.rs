//! Judge identity

use serde::{Deserialize, Serialize};

/// One persona on the panel.
///
/// Persona knowledge is not data: it is resolved by whatever backs the judge
/// role at run time (a hosted model prompt or the offline rubric judge).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JudgeProfile {
    /// Machine identity, e.g. `Judge_Steve_Jobs`.
    pub id: String,
    /// Human-facing persona name, e.g. `Steve Jobs`.
    pub label: String,
    /// Metric the offline rubric judge asks for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
}

impl JudgeProfile {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into(), metric: None }
    }

    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = Some(metric.into());
        self
    }

    /// Parse the CLI form `id:label` (label defaults to the id with `Judge_`
    /// stripped and underscores turned into spaces).
    pub fn parse_spec(spec: &str) -> Option<Self> {
        let (id, label) = match spec.split_once(':') {
            Some((id, label)) => (id.trim(), label.trim().to_string()),
            None => {
                let id = spec.trim();
                (id, id.trim_start_matches("Judge_").replace('_', " "))
            }
        };
        if id.is_empty() || label.is_empty() {
            return None;
        }
        Some(Self::new(id, label))
    }
}

impl std::fmt::Display for JudgeProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spec_with_label() {
        let j = JudgeProfile::parse_spec("Judge_Steve_Jobs:Steve Jobs").unwrap();
        assert_eq!(j.id, "Judge_Steve_Jobs");
        assert_eq!(j.label, "Steve Jobs");
    }

    #[test]
    fn test_parse_spec_derives_label() {
        let j = JudgeProfile::parse_spec("Judge_Donald_Trump").unwrap();
        assert_eq!(j.label, "Donald Trump");
        assert!(JudgeProfile::parse_spec(":x").is_none());
    }
}

//! Result Extractor
//!
//! Recovers a [`Verdict`] from whatever a session produced. Judges are asked
//! for a JSON object but wrap it in prose, code fences or leave it truncated,
//! so extraction walks a fixed list of strategies and never fails:
//!
//! 1. a structured record is taken as is
//! 2. the first fenced block tagged `json`
//! 3. the last `}` paired with each preceding `{`, nearest first, up to a fixed
//!    number of candidates
//! 4. the whole text
//! 5. the failure verdict, carrying a snippet of the raw text

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::config::defaults::{FAILURE_SNIPPET_CHARS, MAX_BRACE_CANDIDATES};
use crate::types::Verdict;

/// What the session handed over.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    Text(String),
    Record(Value),
}

impl From<String> for RawOutput {
    fn from(text: String) -> Self {
        RawOutput::Text(text)
    }
}

impl From<&str> for RawOutput {
    fn from(text: &str) -> Self {
        RawOutput::Text(text.to_string())
    }
}

impl From<Value> for RawOutput {
    fn from(value: Value) -> Self {
        RawOutput::Record(value)
    }
}

/// Which strategy produced a parsed verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Structured,
    FencedBlock,
    BraceScan,
    WholeText,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Structured => write!(f, "structured"),
            Strategy::FencedBlock => write!(f, "fenced_block"),
            Strategy::BraceScan => write!(f, "brace_scan"),
            Strategy::WholeText => write!(f, "whole_text"),
        }
    }
}

/// Extraction result. Both arms carry a usable verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Parsed { verdict: Verdict, strategy: Strategy },
    Fallback { verdict: Verdict },
}

impl Extraction {
    pub fn verdict(&self) -> &Verdict {
        match self {
            Extraction::Parsed { verdict, .. } | Extraction::Fallback { verdict } => verdict,
        }
    }

    pub fn into_verdict(self) -> Verdict {
        match self {
            Extraction::Parsed { verdict, .. } | Extraction::Fallback { verdict } => verdict,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Extraction::Fallback { .. })
    }
}

fn fence_regex() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```[ \t]*(?i:json)[ \t]*\r?\n?(.*?)```").ok())
        .as_ref()
}

/// Recover a verdict for `judge` from raw session output.
pub fn extract(raw: impl Into<RawOutput>, judge: &str) -> Extraction {
    let text = match raw.into() {
        RawOutput::Record(value) => match Verdict::from_value(&value) {
            Some(verdict) => return parsed(verdict, Strategy::Structured, judge),
            None => value.to_string(),
        },
        RawOutput::Text(text) => text,
    };

    if let Some(verdict) = from_fenced_block(&text) {
        return parsed(verdict, Strategy::FencedBlock, judge);
    }
    if let Some(verdict) = from_brace_scan(&text) {
        return parsed(verdict, Strategy::BraceScan, judge);
    }
    if let Some(verdict) = parse_verdict(text.trim()) {
        return parsed(verdict, Strategy::WholeText, judge);
    }

    warn!(judge, chars = text.len(), "No verdict found in session output");
    Extraction::Fallback {
        verdict: Verdict::failure(judge, format!("Raw output: {}", snippet(&text))),
    }
}

fn parsed(mut verdict: Verdict, strategy: Strategy, judge: &str) -> Extraction {
    if verdict.judge.trim().is_empty() {
        verdict.judge = judge.to_string();
    }
    debug!(judge, %strategy, severity = verdict.severity, "Verdict extracted");
    Extraction::Parsed { verdict, strategy }
}

fn parse_verdict(candidate: &str) -> Option<Verdict> {
    let value: Value = serde_json::from_str(candidate).ok()?;
    Verdict::from_value(&value)
}

fn from_fenced_block(text: &str) -> Option<Verdict> {
    let re = fence_regex()?;
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .find_map(|body| parse_verdict(body.as_str().trim()))
}

/// Pair the last closing brace with every opening brace before it, nearest
/// first, so the innermost complete object that parses wins over prose braces.
fn from_brace_scan(text: &str) -> Option<Verdict> {
    let end = text.rfind('}')?;
    text[..end]
        .char_indices()
        .filter(|&(_, c)| c == '{')
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .take(MAX_BRACE_CANDIDATES)
        .find_map(|start| parse_verdict(&text[start..=end]))
}

fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= FAILURE_SNIPPET_CHARS {
        trimmed.to_string()
    } else {
        trimmed.chars().take(FAILURE_SNIPPET_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{VerdictStatus, PARSE_FAILURE_MARKER};
    use serde_json::json;

    const JUDGE: &str = "Judge_Steve_Jobs";

    #[test]
    fn test_structured_record() {
        let record = json!({"metric_analyzed": "hand_spread", "severity": 0.4, "description": "ok"});
        let ex = extract(record, JUDGE);
        assert!(matches!(ex, Extraction::Parsed { strategy: Strategy::Structured, .. }));
        assert_eq!(ex.verdict().judge, JUDGE);
    }

    #[test]
    fn test_fenced_block() {
        let text = "Here is my verdict:\n```json\n{\"metric_analyzed\": \"index_finger_gap\", \"severity\": 0.8, \"description\": \"Hands apart\", \"judge\": \"Judge_X\"}\n```\nTERMINATE";
        let ex = extract(text, JUDGE);
        match ex {
            Extraction::Parsed { verdict, strategy } => {
                assert_eq!(strategy, Strategy::FencedBlock);
                assert_eq!(verdict.metric_analyzed, "index_finger_gap");
                assert_eq!(verdict.judge, "Judge_X");
            }
            other => panic!("expected parsed, got {other:?}"),
        }
    }

    #[test]
    fn test_brace_scan_with_prose_braces() {
        let text = "I used {curly} notes. Result {\"metric_analyzed\": \"m\", \"severity\": 0.2, \"description\": \"d\"} done";
        let ex = extract(text, JUDGE);
        assert!(matches!(ex, Extraction::Parsed { strategy: Strategy::BraceScan, .. }));
        assert_eq!(ex.verdict().severity, 0.2);
    }

    #[test]
    fn test_nested_braces_prefer_outer_verdict() {
        let text = "Final: {\"metric_analyzed\": \"m\", \"severity\": 0.5, \"description\": \"d\", \"details\": {\"a\": 1}}";
        let ex = extract(text, JUDGE);
        assert!(!ex.is_fallback());
        assert_eq!(ex.verdict().metric_analyzed, "m");
    }

    #[test]
    fn test_brace_scan_after_long_brace_heavy_prose() {
        let text = format!(
            "{}Verdict: {{\"metric_analyzed\": \"m\", \"severity\": 0.6, \"description\": \"d\"}}",
            "{aside} ".repeat(5_000)
        );
        let ex = extract(text, JUDGE);
        assert!(matches!(ex, Extraction::Parsed { strategy: Strategy::BraceScan, .. }));
        assert_eq!(ex.verdict().severity, 0.6);
    }

    #[test]
    fn test_brace_scan_gives_up_past_candidate_limit() {
        let text = format!(
            "Final: {{\"metric_analyzed\": \"m\", \"severity\": 0.5, \"description\": \"d\", \"notes\": \"{}\"}}",
            "{".repeat(MAX_BRACE_CANDIDATES)
        );
        assert!(extract(text, JUDGE).is_fallback());
    }

    #[test]
    fn test_empty_text_falls_back() {
        let ex = extract("", JUDGE);
        let v = ex.verdict();
        assert!(ex.is_fallback());
        assert_eq!(v.metric_analyzed, PARSE_FAILURE_MARKER);
        assert_eq!(v.severity, 0.0);
        assert_eq!(v.status, VerdictStatus::Failed);
        assert_eq!(v.judge, JUDGE);
    }

    #[test]
    fn test_prose_falls_back_with_bounded_snippet() {
        let prose = "The speaker looked confident. ".repeat(50);
        let ex = extract(prose.as_str(), JUDGE);
        assert!(ex.is_fallback());
        let desc = &ex.verdict().description;
        assert!(desc.contains("The speaker looked confident."));
        assert!(desc.chars().count() <= FAILURE_SNIPPET_CHARS + "Raw output: ".len());
    }

    #[test]
    fn test_malformed_braces_fall_back() {
        for text in ["{{{", "}{", "{\"severity\": }", "{\"unrelated\": true}"] {
            assert!(extract(text, JUDGE).is_fallback(), "{text}");
        }
    }

    #[test]
    fn test_string_severity_is_normalized() {
        let ex = extract(r#"{"suggestion": "Wider", "severity": "2"}"#, JUDGE);
        assert!(matches!(ex, Extraction::Parsed { strategy: Strategy::BraceScan, .. }));
        assert!((ex.verdict().severity - 2.0 / 3.0).abs() < 1e-9);
    }
}

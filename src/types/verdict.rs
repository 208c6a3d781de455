//! Verdict types: Verdict, VerdictStatus, SeverityBand and severity normalization
//!
//! The canonical severity scale is continuous `[0.0, 1.0]`. Judges have been
//! observed emitting a signed ordinal (`-1..=3`), an integer `0..=3` scale and
//! band names; [`normalize_severity`] maps all of them onto the canonical scale.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Upper bound of the canonical severity scale.
pub const SEVERITY_MAX: f64 = 1.0;

/// Metric label carried by every extraction-failure verdict.
pub const PARSE_FAILURE_MARKER: &str = "Analysis Parsing Failed";

// ============================================================================
// Severity Bands
// ============================================================================

/// Qualitative class of a severity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    /// Inside the persona's reference range.
    Strength,
    /// Just outside the range.
    Pass,
    /// Clearly outside the range.
    Warning,
    /// More than one range span away.
    Critical,
}

impl SeverityBand {
    /// Classify a canonical severity.
    ///
    /// Boundaries: strength `< 0.3`, pass `< 0.6`, warning `< 0.9`, critical otherwise.
    pub fn from_severity(severity: f64) -> Self {
        if severity < 0.3 {
            SeverityBand::Strength
        } else if severity < 0.6 {
            SeverityBand::Pass
        } else if severity < 0.9 {
            SeverityBand::Warning
        } else {
            SeverityBand::Critical
        }
    }

    /// Representative severity used when a judge reports only a band name.
    pub fn representative(self) -> f64 {
        match self {
            SeverityBand::Strength => 0.15,
            SeverityBand::Pass => 0.45,
            SeverityBand::Warning => 0.7,
            SeverityBand::Critical => 0.95,
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        let upper = label.trim().to_uppercase();
        if upper.contains("CRITICAL") || upper.contains("SEVERE") {
            Some(SeverityBand::Critical)
        } else if upper.contains("WARNING") || upper.contains("HIGH") {
            Some(SeverityBand::Warning)
        } else if upper.contains("PASS") || upper.contains("MEDIUM") || upper.contains("ACCEPTABLE") {
            Some(SeverityBand::Pass)
        } else if upper.contains("STRENGTH") || upper.contains("GOOD") || upper.contains("LOW") {
            Some(SeverityBand::Strength)
        } else {
            None
        }
    }
}

impl std::fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeverityBand::Strength => write!(f, "STRENGTH"),
            SeverityBand::Pass => write!(f, "PASS"),
            SeverityBand::Warning => write!(f, "WARNING"),
            SeverityBand::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Map a numeric severity from any observed judge scale onto `[0, 1]`.
///
/// - `[0, 1]` is already canonical
/// - `(1, 3]` is the integer 0–3 scale, divided by 3
/// - negatives are the signed ordinal's "strength" (-1) and map to 0
/// - anything larger clamps to 1
pub fn normalize_severity(raw: f64) -> Option<f64> {
    if !raw.is_finite() {
        return None;
    }
    let canonical = if raw < 0.0 {
        0.0
    } else if raw <= SEVERITY_MAX {
        raw
    } else if raw <= 3.0 {
        raw / 3.0
    } else {
        SEVERITY_MAX
    };
    Some(canonical)
}

/// Read a severity from a JSON value: number, numeric string or band name.
pub fn severity_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().and_then(normalize_severity),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) => normalize_severity(n),
            Err(_) => SeverityBand::from_label(s).map(SeverityBand::representative),
        },
        _ => None,
    }
}

// ============================================================================
// Verdict
// ============================================================================

/// Whether a verdict was recovered from judge output or synthesized on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    #[default]
    Parsed,
    Failed,
}

/// One judge's structured conclusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Metric (or suggestion headline) the judge evaluated.
    pub metric_analyzed: String,
    /// Canonical severity in `[0, 1]`.
    pub severity: f64,
    /// Free-text critique or suggestion.
    pub description: String,
    /// Machine identity of the judge that produced this verdict.
    pub judge: String,
    #[serde(default)]
    pub status: VerdictStatus,
}

impl Verdict {
    /// Build the fixed-shape failure verdict.
    pub fn failure(judge: &str, diagnostic: impl Into<String>) -> Self {
        Self {
            metric_analyzed: PARSE_FAILURE_MARKER.to_string(),
            severity: 0.0,
            description: diagnostic.into(),
            judge: judge.to_string(),
            status: VerdictStatus::Failed,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == VerdictStatus::Failed
    }

    pub fn band(&self) -> SeverityBand {
        SeverityBand::from_severity(self.severity)
    }

    /// Map a loosely-shaped JSON object onto a verdict.
    ///
    /// Accepts both observed spellings: `{metric_analyzed, description}` and
    /// `{suggestion, ...}`. Returns `None` unless the object carries at least
    /// one verdict field, so arbitrary objects are not mistaken for verdicts.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let text = |keys: &[&str]| -> Option<String> {
            keys.iter()
                .filter_map(|k| obj.get(*k))
                .find_map(|v| match v {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    Value::Null | Value::String(_) => None,
                    other => Some(other.to_string()),
                })
        };

        let severity_field = ["severity", "score", "severity_score"]
            .iter()
            .find_map(|k| obj.get(*k));
        let metric = text(&["metric_analyzed", "metric", "metric_name"]);
        let description = text(&["description", "verdict", "comment", "reasoning"]);
        let suggestion = text(&["suggestion"]);

        if severity_field.is_none() && metric.is_none() && description.is_none() && suggestion.is_none() {
            return None;
        }

        // `suggestion` fills whichever slot the judge left empty
        let (metric, description) = match (metric, description, suggestion) {
            (Some(m), Some(d), _) => (m, d),
            (Some(m), None, s) => (m, s.unwrap_or_default()),
            (None, Some(d), s) => (s.unwrap_or_else(|| "Unspecified".to_string()), d),
            (None, None, Some(s)) => ("Suggestion".to_string(), s),
            (None, None, None) => ("Unspecified".to_string(), String::new()),
        };

        let severity = severity_field.and_then(severity_from_value).unwrap_or_else(|| {
            tracing::debug!("Verdict carried no usable severity, defaulting to 0.0");
            0.0
        });

        Some(Self {
            metric_analyzed: metric,
            severity,
            description,
            judge: text(&["judge", "judge_name", "source"]).unwrap_or_default(),
            status: VerdictStatus::Parsed,
        })
    }
}

//! Aggregated panel report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{SeverityBand, Verdict};

/// A verdict with its preference weighting applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedVerdict {
    #[serde(flatten)]
    pub verdict: Verdict,
    /// Persona display name.
    pub label: String,
    /// Preference multiplier applied (1.0 when the judge has no stored weight).
    pub weight: f64,
    /// `severity * weight`, the sort key.
    pub effective_severity: f64,
    pub band: SeverityBand,
}

/// Ranked output of one evaluation run, most severe first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<RankedVerdict>,
}

impl AggregatedReport {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Judge ids in report order.
    pub fn judges(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.verdict.judge.as_str()).collect()
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| e.verdict.is_failure()).count()
    }

    /// Human-readable summary, one line per judge.
    pub fn to_text(&self) -> String {
        let mut out = format!(
            "Panel report {} ({} judges, {} failed)\n",
            self.run_id,
            self.entries.len(),
            self.failures()
        );
        for (rank, e) in self.entries.iter().enumerate() {
            out.push_str(&format!(
                "{:>2}. [{}] {}: {} (severity {:.2} x weight {:.2} = {:.2})\n    {}\n",
                rank + 1,
                e.band,
                e.label,
                e.verdict.metric_analyzed,
                e.verdict.severity,
                e.weight,
                e.effective_severity,
                e.verdict.description
            ));
        }
        out
    }
}

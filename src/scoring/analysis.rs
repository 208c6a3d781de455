//! Clip comparison
//!
//! Aggregates a metric over the user clip and every reference clip (mean over
//! frames that yield a value), then scores the user aggregate against the
//! reference range. The outcome is the JSON record the metric engineer hands
//! back to the judge.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::metrics::Metric;
use super::rubric::{severity, ReferenceStats};
use crate::types::{Clip, SeverityBand};

/// Mean of a metric over the frames of one clip. `None` when no frame yields a value.
pub fn clip_aggregate(metric: Metric, clip: &Clip) -> Option<f64> {
    let values: Vec<f64> = clip.iter().filter_map(|frame| metric.evaluate(frame)).collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// A user measurement compared against the reference range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub metric_name: String,
    pub user_value: f64,
    pub ref_min: f64,
    pub ref_max: f64,
    pub ref_mean: f64,
    pub ref_std: f64,
    pub samples: usize,
    pub severity: f64,
    pub band: SeverityBand,
}

/// Why an analysis produced no comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnalysisError {
    #[serde(rename = "No User Data")]
    NoUserData,
    #[serde(rename = "Computation Failed")]
    ComputationFailed,
    #[serde(rename = "Reference Computation Failed")]
    ReferenceComputationFailed,
}

/// Result of one metric analysis, serialized for the judge.
///
/// The three shapes stay distinguishable on the wire: a comparison carries
/// `ref_*` statistics, the missing-reference sentinel carries `status` and a
/// severity of 1.0, and failures carry `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Comparison(Comparison),
    ReferenceMissing {
        metric_name: String,
        user_value: f64,
        ref_min: f64,
        ref_max: f64,
        ref_mean: f64,
        status: String,
        severity: f64,
    },
    Failed {
        error: AnalysisError,
        description: String,
    },
}

impl AnalysisOutcome {
    fn reference_missing(metric: Metric) -> Self {
        AnalysisOutcome::ReferenceMissing {
            metric_name: metric.name().to_string(),
            user_value: 0.0,
            ref_min: 0.0,
            ref_max: 0.0,
            ref_mean: 0.0,
            status: "Reference Data Missing".to_string(),
            severity: 1.0,
        }
    }

    fn failed(error: AnalysisError, description: impl Into<String>) -> Self {
        AnalysisOutcome::Failed { error, description: description.into() }
    }

    /// Severity carried by the record, if any.
    pub fn severity(&self) -> Option<f64> {
        match self {
            AnalysisOutcome::Comparison(c) => Some(c.severity),
            AnalysisOutcome::ReferenceMissing { severity, .. } => Some(*severity),
            AnalysisOutcome::Failed { .. } => None,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"error":"Computation Failed","description":"serialization error: {e}"}}"#)
        })
    }
}

/// Compare the user clip against a judge's reference clips on one metric.
pub fn run_analysis(judge: &str, metric: Metric, user: &Clip, references: &[Clip]) -> AnalysisOutcome {
    info!(judge, metric = %metric, user_frames = user.len(), references = references.len(), "Running analysis");

    if user.is_empty() {
        warn!(judge, "User clip is empty");
        return AnalysisOutcome::failed(
            AnalysisError::NoUserData,
            "The user landmark clip could not be loaded or was empty.",
        );
    }

    if references.is_empty() {
        warn!(judge, "No reference clips, returning missing-reference record");
        return AnalysisOutcome::reference_missing(metric);
    }

    let Some(user_value) = clip_aggregate(metric, user) else {
        return AnalysisOutcome::failed(
            AnalysisError::ComputationFailed,
            format!("Metric {metric} returned no value for any user frame."),
        );
    };

    let ref_values: Vec<f64> = references
        .iter()
        .filter_map(|clip| clip_aggregate(metric, clip))
        .collect();
    debug!(judge, metric = %metric, ?ref_values, "Reference aggregates");

    let Some(stats) = ReferenceStats::from_values(&ref_values) else {
        return AnalysisOutcome::failed(
            AnalysisError::ReferenceComputationFailed,
            format!("Metric {metric} returned no value for any reference frame."),
        );
    };

    let severity = severity(user_value, &stats);
    let band = SeverityBand::from_severity(severity);
    info!(judge, metric = %metric, user_value, severity, %band, "Analysis complete");

    AnalysisOutcome::Comparison(Comparison {
        metric_name: metric.name().to_string(),
        user_value,
        ref_min: stats.min,
        ref_max: stats.max,
        ref_mean: stats.mean,
        ref_std: stats.std_dev,
        samples: stats.count,
        severity,
        band,
    })
}

//! Verdict aggregation
//!
//! Applies preference weights and ranks verdicts by `severity * weight`,
//! most severe first. Ties break on judge id so the order is deterministic.

use chrono::Utc;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::storage::PreferenceWeights;
use crate::types::{AggregatedReport, JudgeProfile, RankedVerdict, Verdict};

/// Build the ranked report for the dispatched `judges`.
///
/// `verdicts` is keyed by judge id. A judge without an entry gets the failure
/// verdict, and entries for judges outside the set are dropped, so the report
/// always covers exactly the dispatched judges.
pub fn aggregate(
    mut verdicts: HashMap<String, Verdict>,
    weights: &PreferenceWeights,
    judges: &[JudgeProfile],
) -> AggregatedReport {
    let mut entries: Vec<RankedVerdict> = judges
        .iter()
        .map(|judge| {
            let mut verdict = verdicts
                .remove(&judge.id)
                .unwrap_or_else(|| Verdict::failure(&judge.id, "No verdict was produced for this judge"));
            verdict.judge = judge.id.clone();

            let weight = weights.weight_for(judge);
            RankedVerdict {
                band: verdict.band(),
                effective_severity: verdict.severity * weight,
                label: judge.label.clone(),
                weight,
                verdict,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.effective_severity
            .total_cmp(&a.effective_severity)
            .then_with(|| a.verdict.judge.cmp(&b.verdict.judge))
    });

    let report = AggregatedReport {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        entries,
    };
    info!(
        run_id = %report.run_id,
        judges = report.len(),
        failures = report.failures(),
        "Panel report aggregated"
    );
    report
}

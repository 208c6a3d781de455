//! Range-based rubric
//!
//! Severity depends only on where the user's aggregate falls relative to the
//! span of the reference aggregates:
//!
//! | Position                          | Severity        |
//! |-----------------------------------|-----------------|
//! | inside the range                  | 0.0 – 0.3       |
//! | outside, under half a span away   | 0.4 – 0.6       |
//! | outside, under one span away      | 0.7 – 0.8       |
//! | one span or more away             | 0.9 – 1.0       |

use serde::Serialize;
use statrs::statistics::Statistics;

use crate::config::defaults::RANGE_EPSILON;

/// Summary of the per-clip reference aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub count: usize,
}

impl ReferenceStats {
    /// Summarize reference aggregates. `None` when there are no finite values.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }
        Some(Self {
            min: Statistics::min(&finite),
            max: Statistics::max(&finite),
            mean: Statistics::mean(&finite),
            std_dev: Statistics::population_std_dev(&finite),
            count: finite.len(),
        })
    }

    /// Width of the reference range, floored to avoid division by zero.
    pub fn span(&self) -> f64 {
        (self.max - self.min).max(RANGE_EPSILON)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Severity of a user aggregate against the reference range.
pub fn severity(user: f64, stats: &ReferenceStats) -> f64 {
    let span = stats.span();

    let score = if stats.contains(user) {
        // Distance from the mean can exceed half a span when the mean is off-center.
        let normalized = (user - stats.mean).abs() / (span / 2.0);
        0.3 * normalized.min(1.0)
    } else {
        let to_edge = (user - stats.min).abs().min((user - stats.max).abs());
        let factor = to_edge / span;
        if factor < 0.5 {
            0.4 + factor * 0.4
        } else if factor < 1.0 {
            0.6 + factor * 0.2
        } else {
            0.9 + ((factor - 1.0) * 0.1).min(0.1)
        }
    };

    score.clamp(0.0, 1.0)
}

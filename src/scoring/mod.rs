//! Scoring Engine
//!
//! Turns pose clips into a bounded severity:
//!
//! 1. `metrics`: per-frame measurements from the fixed catalog
//! 2. `analysis`: per-clip aggregates and user-vs-reference comparison
//! 3. `rubric`: range statistics and the severity formula
//!
//! Everything here is synchronous and pure apart from logging.

pub mod analysis;
pub mod metrics;
pub mod rubric;

pub use analysis::{clip_aggregate, run_analysis, AnalysisError, AnalysisOutcome, Comparison};
pub use metrics::{catalog, Metric};
pub use rubric::{severity, ReferenceStats};

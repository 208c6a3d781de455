//! Shared data structures for the judge panel
//!
//! - Pose data: Landmark, Frame, Clip (normalized once by the clip loader)
//! - JudgeProfile: panel member identity
//! - Verdict: one judge's structured conclusion on the canonical severity scale
//! - AggregatedReport: weighted, ranked verdicts for one run

mod judge;
mod pose;
mod report;
mod verdict;

pub use judge::*;
pub use pose::*;
pub use report::*;
pub use verdict::*;

//! Aura Panel: persona judges for body-language critique
//!
//! A panel of judges, each impersonating a public speaker, evaluates a pose
//! clip against that speaker's reference recordings and the verdicts are
//! ranked into one report.
//!
//! ## Architecture
//!
//! - **Clip**: lenient landmark loading, reference discovery, frame ingestion
//! - **Scoring**: metric catalog and the range-based severity rubric
//! - **Session**: bounded judge/collaborator conversation with an explicit phase machine
//! - **Extract**: best-effort verdict recovery from free text
//! - **Dispatch**: concurrent sessions, weighting and ranking
//! - **Agents**: metric engineer, offline rubric judge, OpenAI-compatible judge
//! - **Storage**: preference weights behind a lock file

pub mod agents;
pub mod clip;
pub mod config;
pub mod dispatch;
pub mod extract;
pub mod panel;
pub mod scoring;
pub mod session;
pub mod storage;
pub mod types;

pub use config::{ConfigError, PanelConfig};
pub use dispatch::{aggregate, Dispatcher, SessionAgents, SessionFactory};
pub use extract::{extract, Extraction, RawOutput, Strategy};
pub use panel::{evaluate, EvaluationRequest, JudgeBackend};
pub use scoring::{run_analysis, severity, AnalysisOutcome, Metric, ReferenceStats};
pub use session::{ChatAgent, SessionError, SessionOutcome, SessionPhase, SessionRunner};
pub use storage::{PreferenceStore, PreferenceWeights, StorageError};
pub use types::{
    AggregatedReport, Clip, Frame, JudgeProfile, Landmark, RankedVerdict, SeverityBand, Verdict,
    VerdictStatus,
};

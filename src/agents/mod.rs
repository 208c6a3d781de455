//! Session participants
//!
//! - [`MetricEngineer`]: built-in collaborator computing catalog metrics
//! - [`RubricJudge`]: deterministic judge for offline runs
//! - [`OpenAiChatAgent`]: judge backed by an OpenAI-compatible chat endpoint
//! - [`AgentDefinition`]: JSON definitions for model-backed judges

pub mod engineer;
pub mod loader;
pub mod openai;
pub mod rubric_judge;

pub use engineer::{requested_metric, MetricEngineer, ENGINEER_NAME};
pub use loader::AgentDefinition;
pub use openai::{ChatModelSettings, OpenAiChatAgent};
pub use rubric_judge::RubricJudge;

//! Evaluation Session Protocol
//!
//! One judge, one collaborator, a bounded number of turns:
//!
//! - `agent`: the [`ChatAgent`] trait both roles implement, plus transcript types
//! - `phase`: the explicit Research → Command → Verdict → Terminated machine
//! - `script`: the opening task handed to the judge
//! - `runner`: the turn loop with sentinel, budget, deadline and cancellation

pub mod agent;
pub mod phase;
pub mod runner;
pub mod script;

pub use agent::{last_from, AgentError, ChatAgent, ChatMessage, ChatRole, TurnContext};
pub use phase::{PhaseEvent, SessionPhase};
pub use runner::{SessionError, SessionOutcome, SessionRunner, TerminationReason};
pub use script::{task_script, VERDICT_SCHEMA};

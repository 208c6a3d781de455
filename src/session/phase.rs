//! Session state machine
//!
//! ```text
//!   Research --judge--> Command --collaborator--> Verdict
//!                          ^                         |
//!                          +---------judge-----------+
//!
//!   any state --sentinel | budget | deadline | cancel--> Terminated
//! ```
//!
//! In `Research` the judge picks a metric and issues its engineering
//! instruction; `Command` waits on the collaborator; in `Verdict` the judge
//! has data to compare and is expected to emit its verdict. A judge turn in
//! `Verdict` without the sentinel is a follow-up instruction.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Research,
    Command,
    Verdict,
    Terminated,
}

/// Something that happened during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    JudgeSpoke,
    CollaboratorSpoke,
    SentinelSeen,
    BudgetExhausted,
    DeadlineReached,
    Cancelled,
}

impl SessionPhase {
    pub fn next(self, event: PhaseEvent) -> SessionPhase {
        use PhaseEvent::*;
        use SessionPhase::*;

        match (self, event) {
            (Terminated, _) => Terminated,
            (_, SentinelSeen | BudgetExhausted | DeadlineReached | Cancelled) => Terminated,
            (Research, JudgeSpoke) => Command,
            (Research, CollaboratorSpoke) => Research,
            (Command, CollaboratorSpoke) => Verdict,
            (Command, JudgeSpoke) => Command,
            (Verdict, JudgeSpoke) => Command,
            (Verdict, CollaboratorSpoke) => Verdict,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == SessionPhase::Terminated
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Research => write!(f, "RESEARCH"),
            SessionPhase::Command => write!(f, "COMMAND"),
            SessionPhase::Verdict => write!(f, "VERDICT"),
            SessionPhase::Terminated => write!(f, "TERMINATED"),
        }
    }
}

//! Task script that opens every session
//!
//! The script is the contract between the session and whatever backs the
//! judge role: pick a metric, instruct the engineer once, compare the result
//! against the rubric and answer with one JSON verdict plus the sentinel.

use crate::scoring::catalog;
use crate::types::{landmark_reference, JudgeProfile};

/// JSON shape judges are asked to emit.
pub const VERDICT_SCHEMA: &str = r#"{"metric_analyzed": "<metric name>", "severity": <0.0-1.0>, "description": "<critique in your persona's voice>", "judge": "<your id>"}"#;

/// Build the opening task for one judge.
pub fn task_script(judge: &JudgeProfile, termination_token: &str) -> String {
    format!(
        "You are {id}, judging the speaker as {label} would.\n\
         Evaluate the speaker's body language from the pose landmarks in the user clip \
         against {label}'s reference recordings.\n\n\
         Protocol:\n\
         1. Decide which metric best captures {label}'s signature gesture.\n\
         2. Give the Engineer exactly one instruction naming that metric, then stop and wait.\n\
         3. When the Engineer returns user_value and ref_min/ref_max/ref_mean, grade it:\n\
            inside the reference range is a strength (severity 0.0-0.3), just outside is a pass (0.4-0.6),\n\
            clearly outside is a warning (0.7-0.8), more than one range width away is critical (0.9-1.0).\n\
         4. Reply with exactly one JSON verdict and end your message with '{token}'.\n\n\
         Verdict format:\n{schema}\n\n\
         Metrics the Engineer can compute:\n{catalog}\n\n\
         Landmark indices:\n{landmarks}",
        id = judge.id,
        label = judge.label,
        token = termination_token,
        schema = VERDICT_SCHEMA,
        catalog = catalog(),
        landmarks = landmark_reference(),
    )
}

//! Terminal decision about an outbound call

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of watching a dialed participant during the answer window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    /// A human answered
    Attended,
    /// The callee declined the call
    Rejected,
    /// The callee could not be reached
    Unavailable,
    /// No terminal status within the answer window
    TimedOut,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Attended => "attended",
            CallOutcome::Rejected => "rejected",
            CallOutcome::Unavailable => "unavailable",
            CallOutcome::TimedOut => "timed_out",
        }
    }

    /// Everything except an answered call ends the session
    pub fn requires_teardown(&self) -> bool {
        !matches!(self, CallOutcome::Attended)
    }
}

impl fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Call outcome monitor
//!
//! Polls the callee's `sip.callStatus` attribute and disconnect reason on a
//! fixed cadence until a human answers, the call is refused, or the answer
//! window runs out.

use crate::domain::call::{CallOutcome, CallStatus, DisconnectReason, ParticipantState, RemoteParticipant};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Result of looking at one participant snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    /// Keep polling
    Pending,
    Terminal(CallOutcome),
}

/// Classify one snapshot.
///
/// `automation` means voicemail/IVR detection is still running; the
/// disconnect reason is not looked at on such a reading.
pub fn evaluate(state: &ParticipantState) -> Reading {
    match state.call_status() {
        Some(CallStatus::Active) => return Reading::Terminal(CallOutcome::Attended),
        Some(CallStatus::Automation) => return Reading::Pending,
        _ => {}
    }

    match state.disconnect_reason {
        Some(DisconnectReason::UserRejected) => Reading::Terminal(CallOutcome::Rejected),
        Some(DisconnectReason::UserUnavailable) => Reading::Terminal(CallOutcome::Unavailable),
        _ => Reading::Pending,
    }
}

#[derive(Debug, Clone)]
pub struct CallOutcomeMonitor {
    answer_timeout: Duration,
    poll_interval: Duration,
}

impl Default for CallOutcomeMonitor {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), Duration::from_millis(100))
    }
}

impl CallOutcomeMonitor {
    pub fn new(answer_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            answer_timeout,
            poll_interval,
        }
    }

    pub fn answer_timeout(&self) -> Duration {
        self.answer_timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll `participant` until a terminal reading or the end of the window.
    ///
    /// The window is measured from entry and never extended.
    pub async fn run(&self, participant: &RemoteParticipant) -> CallOutcome {
        let start = Instant::now();

        let outcome = loop {
            if start.elapsed() >= self.answer_timeout {
                break CallOutcome::TimedOut;
            }

            let snapshot = participant.snapshot();
            match evaluate(&snapshot) {
                Reading::Terminal(outcome) => break outcome,
                Reading::Pending => {
                    debug!(
                        identity = %participant.identity(),
                        status = ?snapshot.call_status(),
                        "call not decided yet"
                    );
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        };

        match outcome {
            CallOutcome::Attended => info!("Status: User Attended"),
            CallOutcome::Rejected => info!("Status: User Rejected"),
            CallOutcome::Unavailable => info!("Status: User Unavailable"),
            CallOutcome::TimedOut => {}
        }
        metrics::counter!("outbound_call_outcomes_total", "outcome" => outcome.as_str())
            .increment(1);

        outcome
    }
}

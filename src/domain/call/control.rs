//! Single-shot termination signal for a call session
//!
//! The outcome monitor, the `end_call` tool and the agent runner can all
//! decide to end a session. Only the first decision is recorded; everyone
//! else observes that the session is already over.

use crate::domain::call::outcome::CallOutcome;
use std::sync::OnceLock;
use tokio_util::sync::CancellationToken;

/// Why a call session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The outcome monitor reached a terminal decision
    Outcome(CallOutcome),
    /// The agent hung up through the `end_call` tool
    EndCall,
    /// The room connection went away
    RoomClosed,
    /// The agent runner stopped on its own
    AgentStopped,
    /// The callee hung up after answering
    CalleeLeft,
}

#[derive(Debug, Default)]
pub struct CallSessionControl {
    token: CancellationToken,
    reason: OnceLock<ShutdownReason>,
}

impl CallSessionControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `reason` and cancel the session.
    ///
    /// Returns `true` for the caller that actually ended the session.
    pub fn shutdown(&self, reason: ShutdownReason) -> bool {
        let first = self.reason.set(reason).is_ok();
        self.token.cancel();
        first
    }

    /// Reason recorded by the first shutdown, if any
    pub fn reason(&self) -> Option<ShutdownReason> {
        self.reason.get().copied()
    }

    pub fn is_shut_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the session has been shut down
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Token that is cancelled together with the session
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }
}

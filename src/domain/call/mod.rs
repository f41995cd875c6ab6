//! Call bounded context - one outbound call attempt and the callee it targets

pub mod control;
pub mod outcome;
pub mod participant;
pub mod session;

pub use control::{CallSessionControl, ShutdownReason};
pub use outcome::CallOutcome;
pub use participant::{
    CallStatus, DisconnectReason, ParticipantState, RemoteParticipant, CALL_STATUS_ATTRIBUTE,
};
pub use session::CallSession;

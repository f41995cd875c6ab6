//! Remote participant state as maintained by the media platform

use crate::domain::shared::value_objects::ParticipantIdentity;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::watch;

/// Attribute the platform sets on SIP participants to report call progress
pub const CALL_STATUS_ATTRIBUTE: &str = "sip.callStatus";

/// SIP call progress reported through [`CALL_STATUS_ATTRIBUTE`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallStatus {
    Dialing,
    Ringing,
    /// Voicemail or IVR detection in progress
    Automation,
    /// A human picked up
    Active,
    Hangup,
    Other(String),
}

impl CallStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "dialing" => CallStatus::Dialing,
            "ringing" => CallStatus::Ringing,
            "automation" => CallStatus::Automation,
            "active" => CallStatus::Active,
            "hangup" => CallStatus::Hangup,
            other => CallStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CallStatus::Dialing => "dialing",
            CallStatus::Ringing => "ringing",
            CallStatus::Automation => "automation",
            CallStatus::Active => "active",
            CallStatus::Hangup => "hangup",
            CallStatus::Other(value) => value,
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a participant left the room
///
/// Serialized with the platform's wire names (`USER_REJECTED`, ...). Values
/// this crate does not know about are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    UnknownReason,
    ClientInitiated,
    DuplicateIdentity,
    ServerShutdown,
    ParticipantRemoved,
    RoomDeleted,
    StateMismatch,
    JoinFailure,
    Migration,
    SignalClose,
    RoomClosed,
    UserUnavailable,
    UserRejected,
    SipTrunkFailure,
    Other(String),
}

impl DisconnectReason {
    pub fn parse(value: &str) -> Self {
        match value {
            "UNKNOWN_REASON" => DisconnectReason::UnknownReason,
            "CLIENT_INITIATED" => DisconnectReason::ClientInitiated,
            "DUPLICATE_IDENTITY" => DisconnectReason::DuplicateIdentity,
            "SERVER_SHUTDOWN" => DisconnectReason::ServerShutdown,
            "PARTICIPANT_REMOVED" => DisconnectReason::ParticipantRemoved,
            "ROOM_DELETED" => DisconnectReason::RoomDeleted,
            "STATE_MISMATCH" => DisconnectReason::StateMismatch,
            "JOIN_FAILURE" => DisconnectReason::JoinFailure,
            "MIGRATION" => DisconnectReason::Migration,
            "SIGNAL_CLOSE" => DisconnectReason::SignalClose,
            "ROOM_CLOSED" => DisconnectReason::RoomClosed,
            "USER_UNAVAILABLE" => DisconnectReason::UserUnavailable,
            "USER_REJECTED" => DisconnectReason::UserRejected,
            "SIP_TRUNK_FAILURE" => DisconnectReason::SipTrunkFailure,
            other => DisconnectReason::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DisconnectReason::UnknownReason => "UNKNOWN_REASON",
            DisconnectReason::ClientInitiated => "CLIENT_INITIATED",
            DisconnectReason::DuplicateIdentity => "DUPLICATE_IDENTITY",
            DisconnectReason::ServerShutdown => "SERVER_SHUTDOWN",
            DisconnectReason::ParticipantRemoved => "PARTICIPANT_REMOVED",
            DisconnectReason::RoomDeleted => "ROOM_DELETED",
            DisconnectReason::StateMismatch => "STATE_MISMATCH",
            DisconnectReason::JoinFailure => "JOIN_FAILURE",
            DisconnectReason::Migration => "MIGRATION",
            DisconnectReason::SignalClose => "SIGNAL_CLOSE",
            DisconnectReason::RoomClosed => "ROOM_CLOSED",
            DisconnectReason::UserUnavailable => "USER_UNAVAILABLE",
            DisconnectReason::UserRejected => "USER_REJECTED",
            DisconnectReason::SipTrunkFailure => "SIP_TRUNK_FAILURE",
            DisconnectReason::Other(value) => value,
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DisconnectReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DisconnectReason {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(DisconnectReason::parse(&value))
    }
}

/// Point-in-time view of a remote participant
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParticipantState {
    pub identity: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub disconnect_reason: Option<DisconnectReason>,
    #[serde(default)]
    pub connected: bool,
}

impl ParticipantState {
    pub fn joined(identity: &ParticipantIdentity) -> Self {
        Self {
            identity: identity.as_str().to_string(),
            attributes: HashMap::new(),
            disconnect_reason: None,
            connected: true,
        }
    }

    pub fn call_status(&self) -> Option<CallStatus> {
        self.attributes
            .get(CALL_STATUS_ATTRIBUTE)
            .map(|value| CallStatus::parse(value))
    }
}

/// Read-only handle on a participant whose state the platform keeps current
#[derive(Debug, Clone)]
pub struct RemoteParticipant {
    identity: ParticipantIdentity,
    state: watch::Receiver<ParticipantState>,
}

impl RemoteParticipant {
    pub fn new(identity: ParticipantIdentity, state: watch::Receiver<ParticipantState>) -> Self {
        Self { identity, state }
    }

    pub fn identity(&self) -> &ParticipantIdentity {
        &self.identity
    }

    /// Latest snapshot of the participant
    pub fn snapshot(&self) -> ParticipantState {
        self.state.borrow().clone()
    }

    pub fn attributes(&self) -> HashMap<String, String> {
        self.state.borrow().attributes.clone()
    }

    pub fn call_status(&self) -> Option<CallStatus> {
        self.state.borrow().call_status()
    }

    pub fn disconnect_reason(&self) -> Option<DisconnectReason> {
        self.state.borrow().disconnect_reason.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    /// Resolves once the participant has left the room
    pub async fn disconnected(&self) {
        let mut state = self.state.clone();
        // A dropped sender means the room itself is gone
        let _ = state.wait_for(|state| !state.connected).await;
    }
}

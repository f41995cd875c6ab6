//! Call platform port - administrative operations on rooms and SIP calls

use crate::domain::shared::error::Result;
use crate::domain::shared::value_objects::{ParticipantIdentity, RoomName, SipTrunkId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request to originate a SIP call into a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipDialRequest {
    pub room_name: RoomName,
    pub trunk_id: SipTrunkId,
    pub phone_number: String,
    pub participant_identity: ParticipantIdentity,
}

/// What the platform reports back after accepting a SIP originate request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SipParticipantInfo {
    pub participant_id: String,
    pub participant_identity: String,
    pub room_name: String,
    pub sip_call_id: String,
}

/// This is defined in the domain layer as a trait (port),
/// and implemented in the infrastructure layer (adapter).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallPlatform: Send + Sync {
    /// Dial `request.phone_number` and join the callee to the room
    async fn create_sip_participant(&self, request: &SipDialRequest)
        -> Result<SipParticipantInfo>;

    /// Remove a participant from a room, hanging up its phone leg
    async fn remove_participant(&self, room: &RoomName, identity: &ParticipantIdentity)
        -> Result<()>;
}

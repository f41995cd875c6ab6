//! Call session entity

use crate::domain::shared::error::{DomainError, Result};
use crate::domain::shared::value_objects::{ParticipantIdentity, RoomName, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One outbound call attempt, from job start until the session shuts down
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSession {
    id: SessionId,
    room_name: RoomName,
    /// Destination number, carried in the job metadata
    phone_number: String,
    /// Identity the callee's phone leg gets inside the room
    participant_identity: ParticipantIdentity,
    instructions: String,
    started_at: DateTime<Utc>,
}

impl CallSession {
    pub fn new(
        room_name: RoomName,
        phone_number: &str,
        participant_identity: ParticipantIdentity,
        instructions: String,
    ) -> Result<Self> {
        let phone_number = phone_number.trim();
        if phone_number.is_empty() {
            return Err(DomainError::ValidationError(
                "job metadata must carry the destination phone number".to_string(),
            ));
        }

        Ok(Self {
            id: SessionId::new(),
            room_name,
            phone_number: phone_number.to_string(),
            participant_identity,
            instructions,
            started_at: Utc::now(),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn room_name(&self) -> &RoomName {
        &self.room_name
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn participant_identity(&self) -> &ParticipantIdentity {
        &self.participant_identity
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Append call-specific text to the agent instructions
    pub fn append_instructions(&mut self, extra: &str) {
        self.instructions.push_str(extra);
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

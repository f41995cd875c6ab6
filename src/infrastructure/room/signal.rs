//! JSON signals exchanged with the room relay

use crate::domain::call::DisconnectReason;
use crate::domain::room::AutoSubscribe;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Relay -> worker
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerSignal {
    ParticipantJoined {
        identity: String,
        #[serde(default)]
        attributes: HashMap<String, String>,
    },
    /// Carries the full attribute map
    ParticipantUpdated {
        identity: String,
        #[serde(default)]
        attributes: HashMap<String, String>,
    },
    ParticipantLeft {
        identity: String,
        #[serde(default)]
        disconnect_reason: Option<DisconnectReason>,
    },
    /// Base64 little-endian PCM16 mono
    Audio {
        identity: String,
        data: String,
        sample_rate: u32,
    },
    RoomClosed,
}

/// Worker -> relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientSignal {
    Subscribe { auto_subscribe: AutoSubscribe },
    Audio { data: String, sample_rate: u32 },
    Leave,
}

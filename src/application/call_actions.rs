//! Call actions exposed to the agent's model

use crate::domain::agent::{Tool, ToolSpec};
use crate::domain::call::{CallSessionControl, ShutdownReason};
use crate::domain::platform::CallPlatform;
use crate::domain::shared::value_objects::{ParticipantIdentity, RoomName};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

pub const END_CALL_TOOL: &str = "end_call";
const END_CALL_DESCRIPTION: &str = "Called when the user wants to end the call.";

/// `end_call`: hang up the callee's phone leg
pub struct EndCallTool {
    platform: Arc<dyn CallPlatform>,
    room_name: RoomName,
    participant_identity: ParticipantIdentity,
    control: Arc<CallSessionControl>,
}

impl EndCallTool {
    pub fn new(
        platform: Arc<dyn CallPlatform>,
        room_name: RoomName,
        participant_identity: ParticipantIdentity,
        control: Arc<CallSessionControl>,
    ) -> Self {
        Self {
            platform,
            room_name,
            participant_identity,
            control,
        }
    }

    /// Remove the participant from the room; failures are logged, never returned
    pub async fn hangup(&self) -> bool {
        match self
            .platform
            .remove_participant(&self.room_name, &self.participant_identity)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!("Ending Call Failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl Tool for EndCallTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::without_parameters(END_CALL_TOOL, END_CALL_DESCRIPTION)
    }

    async fn invoke(&self, _arguments: serde_json::Value) -> String {
        info!("Ending Call: {}", self.participant_identity);

        if self.hangup().await {
            metrics::counter!("end_call_invocations_total", "result" => "ok").increment(1);
            self.control.shutdown(ShutdownReason::EndCall);
            "The call has been ended.".to_string()
        } else {
            metrics::counter!("end_call_invocations_total", "result" => "error").increment(1);
            "Failed to end the call.".to_string()
        }
    }
}

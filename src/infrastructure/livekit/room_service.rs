//! `livekit.RoomService` and the `CallPlatform` port on top of it

use super::client::{LiveKitClient, RequestGrants};
use super::token::VideoGrant;
use super::LiveKitError;
use crate::domain::platform::{CallPlatform, SipDialRequest, SipParticipantInfo};
use crate::domain::shared::error::Result;
use crate::domain::shared::value_objects::{ParticipantIdentity, RoomName};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct RoomParticipantIdentity<'a> {
    pub room: &'a str,
    pub identity: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct RemoveParticipantResponse {}

impl LiveKitClient {
    pub async fn remove_participant(
        &self,
        room: &str,
        identity: &str,
    ) -> std::result::Result<(), LiveKitError> {
        let grants = RequestGrants {
            video: Some(VideoGrant::room_admin(room)),
            sip: None,
        };
        let _: RemoveParticipantResponse = self
            .twirp(
                "RoomService",
                "RemoveParticipant",
                grants,
                &RoomParticipantIdentity { room, identity },
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CallPlatform for LiveKitClient {
    async fn create_sip_participant(&self, request: &SipDialRequest) -> Result<SipParticipantInfo> {
        Ok(LiveKitClient::create_sip_participant(self, request).await?)
    }

    async fn remove_participant(&self, room: &RoomName, identity: &ParticipantIdentity) -> Result<()> {
        Ok(LiveKitClient::remove_participant(self, room.as_str(), identity.as_str()).await?)
    }
}

//! Dialer - originate the SIP call and wait for the callee to join

use crate::domain::call::{CallSession, RemoteParticipant};
use crate::domain::platform::{CallPlatform, SipDialRequest};
use crate::domain::room::Room;
use crate::domain::shared::error::Result;
use crate::domain::shared::value_objects::SipTrunkId;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Dialer {
    platform: Arc<dyn CallPlatform>,
    trunk_id: SipTrunkId,
}

impl Dialer {
    pub fn new(platform: Arc<dyn CallPlatform>, trunk_id: SipTrunkId) -> Self {
        Self { platform, trunk_id }
    }

    pub fn trunk_id(&self) -> &SipTrunkId {
        &self.trunk_id
    }

    /// Place the call for `session` and block until its participant is in the room.
    ///
    /// Only the room connection closing bounds the wait. Originate errors
    /// are returned as-is.
    pub async fn dial(&self, room: &dyn Room, session: &CallSession) -> Result<RemoteParticipant> {
        info!(
            "Dialing: {} | Room: {}",
            session.phone_number(),
            room.name()
        );

        let request = SipDialRequest {
            room_name: session.room_name().clone(),
            trunk_id: self.trunk_id.clone(),
            phone_number: session.phone_number().to_string(),
            participant_identity: session.participant_identity().clone(),
        };

        let info = self.platform.create_sip_participant(&request).await?;
        metrics::counter!("outbound_calls_total").increment(1);
        debug!(
            participant_id = %info.participant_id,
            sip_call_id = %info.sip_call_id,
            "SIP participant created"
        );

        room.wait_for_participant(session.participant_identity()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::FakeRoom;
    use crate::domain::platform::{MockCallPlatform, SipParticipantInfo};
    use crate::domain::shared::error::DomainError;
    use crate::domain::shared::value_objects::{ParticipantIdentity, RoomName};

    fn session() -> CallSession {
        CallSession::new(
            RoomName::parse("call-1").unwrap(),
            " +15551230000 ",
            ParticipantIdentity::new("phone_user"),
            String::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_dial_sends_single_request_and_waits_for_participant() {
        let mut platform = MockCallPlatform::new();
        platform
            .expect_create_sip_participant()
            .withf(|req| {
                req.room_name.as_str() == "call-1"
                    && req.trunk_id.as_str() == "ST_trunk"
                    && req.phone_number == "+15551230000"
                    && req.participant_identity.as_str() == "phone_user"
            })
            .times(1)
            .returning(|_| Ok(SipParticipantInfo::default()));

        let room = FakeRoom::new("call-1");
        room.join("phone_user");

        let dialer = Dialer::new(Arc::new(platform), SipTrunkId::parse("ST_trunk").unwrap());
        let participant = dialer.dial(&room, &session()).await.unwrap();
        assert_eq!(participant.identity().as_str(), "phone_user");
    }

    #[tokio::test]
    async fn test_dial_blocks_until_participant_joins() {
        let mut platform = MockCallPlatform::new();
        platform
            .expect_create_sip_participant()
            .returning(|_| Ok(SipParticipantInfo::default()));

        let room = Arc::new(FakeRoom::new("call-1"));
        let dialer = Dialer::new(Arc::new(platform), SipTrunkId::parse("ST_trunk").unwrap());

        let joiner = room.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            joiner.join("phone_user");
        });

        let participant = dialer.dial(room.as_ref(), &session()).await.unwrap();
        assert!(participant.is_connected());
    }

    #[tokio::test]
    async fn test_originate_error_propagates() {
        let mut platform = MockCallPlatform::new();
        platform
            .expect_create_sip_participant()
            .times(1)
            .returning(|_| Err(DomainError::Platform("trunk not found".to_string())));

        let room = FakeRoom::new("call-1");
        let dialer = Dialer::new(Arc::new(platform), SipTrunkId::parse("ST_trunk").unwrap());

        let err = dialer.dial(&room, &session()).await.unwrap_err();
        assert_eq!(err, DomainError::Platform("trunk not found".to_string()));
    }
}

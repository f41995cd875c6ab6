//! `livekit.SIP` service: outbound calls and outbound trunks

use super::client::{LiveKitClient, RequestGrants};
use super::token::SipGrant;
use super::LiveKitError;
use crate::domain::platform::{SipDialRequest, SipParticipantInfo};
use crate::domain::shared::error::Result;
use crate::domain::sip_trunk::{OutboundTrunk, OutboundTrunkInfo, SipTrunkRepository};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

const SERVICE: &str = "SIP";

#[derive(Debug, Serialize)]
pub struct CreateSipParticipantRequest<'a> {
    pub sip_trunk_id: &'a str,
    pub sip_call_to: &'a str,
    pub room_name: &'a str,
    pub participant_identity: &'a str,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SipOutboundTrunkWire {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sip_trunk_id: String,
    pub name: String,
    pub address: String,
    pub numbers: Vec<String>,
    pub auth_username: String,
    pub auth_password: String,
}

impl From<OutboundTrunk> for SipOutboundTrunkWire {
    fn from(trunk: OutboundTrunk) -> Self {
        Self {
            sip_trunk_id: String::new(),
            name: trunk.name,
            address: trunk.address,
            numbers: trunk.numbers,
            auth_username: trunk.auth_username,
            auth_password: trunk.auth_password,
        }
    }
}

impl From<SipOutboundTrunkWire> for OutboundTrunkInfo {
    fn from(wire: SipOutboundTrunkWire) -> Self {
        Self {
            sip_trunk_id: wire.sip_trunk_id,
            name: wire.name,
            address: wire.address,
            numbers: wire.numbers,
            auth_username: wire.auth_username,
            auth_password: wire.auth_password,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateSipOutboundTrunkRequest {
    trunk: SipOutboundTrunkWire,
}

#[derive(Debug, Serialize)]
struct ListSipOutboundTrunkRequest {}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListSipOutboundTrunkResponse {
    items: Vec<SipOutboundTrunkWire>,
}

#[derive(Debug, Serialize)]
struct DeleteSipTrunkRequest<'a> {
    sip_trunk_id: &'a str,
}

/// Generic trunk record returned by `DeleteSIPTrunk`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SipTrunkInfoWire {
    sip_trunk_id: String,
    name: String,
    outbound_address: String,
    outbound_number: String,
    outbound_username: String,
}

impl From<SipTrunkInfoWire> for OutboundTrunkInfo {
    fn from(wire: SipTrunkInfoWire) -> Self {
        let numbers = if wire.outbound_number.is_empty() {
            Vec::new()
        } else {
            vec![wire.outbound_number]
        };
        Self {
            sip_trunk_id: wire.sip_trunk_id,
            name: wire.name,
            address: wire.outbound_address,
            numbers,
            auth_username: wire.outbound_username,
            auth_password: String::new(),
        }
    }
}

fn admin() -> RequestGrants {
    RequestGrants {
        video: None,
        sip: Some(SipGrant {
            admin: true,
            call: false,
        }),
    }
}

impl LiveKitClient {
    pub async fn create_sip_participant(
        &self,
        request: &SipDialRequest,
    ) -> std::result::Result<SipParticipantInfo, LiveKitError> {
        let body = CreateSipParticipantRequest {
            sip_trunk_id: request.trunk_id.as_str(),
            sip_call_to: &request.phone_number,
            room_name: request.room_name.as_str(),
            participant_identity: request.participant_identity.as_str(),
        };
        let grants = RequestGrants {
            video: None,
            sip: Some(SipGrant {
                admin: false,
                call: true,
            }),
        };
        self.twirp(SERVICE, "CreateSIPParticipant", grants, &body).await
    }

    pub async fn create_sip_outbound_trunk(
        &self,
        trunk: OutboundTrunk,
    ) -> std::result::Result<OutboundTrunkInfo, LiveKitError> {
        let body = CreateSipOutboundTrunkRequest {
            trunk: trunk.into(),
        };
        let created: SipOutboundTrunkWire = self
            .twirp(SERVICE, "CreateSIPOutboundTrunk", admin(), &body)
            .await?;
        info!(trunk_id = %created.sip_trunk_id, "outbound trunk created");
        Ok(created.into())
    }

    pub async fn list_sip_outbound_trunks(
        &self,
    ) -> std::result::Result<Vec<OutboundTrunkInfo>, LiveKitError> {
        let response: ListSipOutboundTrunkResponse = self
            .twirp(SERVICE, "ListSIPOutboundTrunk", admin(), &ListSipOutboundTrunkRequest {})
            .await?;
        Ok(response.items.into_iter().map(Into::into).collect())
    }

    pub async fn delete_sip_trunk(
        &self,
        trunk_id: &str,
    ) -> std::result::Result<OutboundTrunkInfo, LiveKitError> {
        let deleted: SipTrunkInfoWire = self
            .twirp(
                SERVICE,
                "DeleteSIPTrunk",
                admin(),
                &DeleteSipTrunkRequest {
                    sip_trunk_id: trunk_id,
                },
            )
            .await?;
        info!(trunk_id = %trunk_id, "trunk deleted");
        Ok(deleted.into())
    }
}

#[async_trait]
impl SipTrunkRepository for LiveKitClient {
    async fn create_trunk(&self, trunk: OutboundTrunk) -> Result<OutboundTrunkInfo> {
        Ok(self.create_sip_outbound_trunk(trunk).await?)
    }

    async fn list_trunks(&self) -> Result<Vec<OutboundTrunkInfo>> {
        Ok(self.list_sip_outbound_trunks().await?)
    }

    async fn delete_trunk(&self, trunk_id: &str) -> Result<OutboundTrunkInfo> {
        Ok(self.delete_sip_trunk(trunk_id).await?)
    }
}

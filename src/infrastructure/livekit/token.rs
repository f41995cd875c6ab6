//! Access tokens for the platform API and room connections
//!
//! Tokens are HS256 JWTs signed with the API secret. `iss` carries the API
//! key, and permissions travel in the `video` and `sip` grant claims.

use super::LiveKitError;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Room permissions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_admin: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_join: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_publish: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_subscribe: Option<bool>,
}

impl VideoGrant {
    /// Administrative access to one room
    pub fn room_admin(room: &str) -> Self {
        Self {
            room_admin: true,
            room: Some(room.to_string()),
            ..Default::default()
        }
    }

    /// Join `room` as a participant that publishes and subscribes
    pub fn room_join(room: &str) -> Self {
        Self {
            room_join: true,
            room: Some(room.to_string()),
            can_publish: Some(true),
            can_subscribe: Some(true),
            ..Default::default()
        }
    }
}

/// SIP permissions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SipGrant {
    /// Manage trunks and dispatch rules
    #[serde(default, skip_serializing_if = "is_false")]
    pub admin: bool,
    /// Place outbound calls
    #[serde(default, skip_serializing_if = "is_false")]
    pub call: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub: String,
    pub nbf: u64,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoGrant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sip: Option<SipGrant>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    api_key: String,
    api_secret: String,
    identity: String,
    ttl: Duration,
    video: Option<VideoGrant>,
    sip: Option<SipGrant>,
}

impl AccessToken {
    pub fn new(api_key: &str, api_secret: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            identity: String::new(),
            ttl: DEFAULT_TTL,
            video: None,
            sip: None,
        }
    }

    pub fn with_identity(mut self, identity: &str) -> Self {
        self.identity = identity.to_string();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_video_grant(mut self, grant: VideoGrant) -> Self {
        self.video = Some(grant);
        self
    }

    pub fn with_sip_grant(mut self, grant: SipGrant) -> Self {
        self.sip = Some(grant);
        self
    }

    pub fn claims(&self) -> Claims {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        Claims {
            iss: self.api_key.clone(),
            sub: self.identity.clone(),
            nbf: now,
            exp: now + self.ttl.as_secs(),
            video: self.video.clone(),
            sip: self.sip.clone(),
        }
    }

    /// Sign the token
    pub fn to_jwt(&self) -> Result<String, LiveKitError> {
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(LiveKitError::Credentials);
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &self.claims(),
            &EncodingKey::from_secret(self.api_secret.as_bytes()),
        )?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    fn decode_claims(token: &str, secret: &str) -> Claims {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;
        decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .unwrap()
            .claims
    }

    #[test]
    fn test_admin_token_claims() {
        let token = AccessToken::new("APIkey", "secret")
            .with_video_grant(VideoGrant::room_admin("call-1"))
            .with_sip_grant(SipGrant {
                call: true,
                ..Default::default()
            })
            .to_jwt()
            .unwrap();

        let claims = decode_claims(&token, "secret");
        assert_eq!(claims.iss, "APIkey");
        assert_eq!(claims.sub, "");
        assert_eq!(claims.exp - claims.nbf, DEFAULT_TTL.as_secs());

        let video = claims.video.unwrap();
        assert!(video.room_admin);
        assert_eq!(video.room.as_deref(), Some("call-1"));
        assert!(claims.sip.unwrap().call);
    }

    #[test]
    fn test_grants_use_camel_case() {
        let json = serde_json::to_value(VideoGrant::room_join("call-1")).unwrap();
        assert_eq!(json["roomJoin"], true);
        assert_eq!(json["canPublish"], true);
        assert_eq!(json["canSubscribe"], true);
        assert!(json.get("roomAdmin").is_none());
    }

    #[test]
    fn test_wrong_secret_fails_verification() {
        let token = AccessToken::new("APIkey", "secret")
            .with_identity("agent")
            .to_jwt()
            .unwrap();
        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"other"),
            &Validation::new(Algorithm::HS256),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_credentials() {
        assert!(matches!(
            AccessToken::new("", "secret").to_jwt(),
            Err(LiveKitError::Credentials)
        ));
    }
}

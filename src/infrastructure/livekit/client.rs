use super::token::{AccessToken, SipGrant, VideoGrant};
use super::{LiveKitError, TwirpErrorBody};
use crate::config::{to_http_url, LiveKitConfig};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Permissions a single request is signed with
#[derive(Debug, Clone, Default)]
pub struct RequestGrants {
    pub video: Option<VideoGrant>,
    pub sip: Option<SipGrant>,
}

#[derive(Clone)]
pub struct LiveKitClient {
    http: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl LiveKitClient {
    pub fn new(url: &str, api_key: &str, api_secret: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: to_http_url(url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        }
    }

    pub fn from_config(config: &LiveKitConfig) -> Self {
        Self::new(&config.url, &config.api_key, &config.api_secret)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A token builder signed with this client's credentials
    pub fn access_token(&self) -> AccessToken {
        AccessToken::new(&self.api_key, &self.api_secret)
    }

    /// Invoke `livekit.<service>/<method>`
    pub async fn twirp<Req, Resp>(
        &self,
        service: &str,
        method: &str,
        grants: RequestGrants,
        body: &Req,
    ) -> Result<Resp, LiveKitError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let mut token = self.access_token();
        if let Some(video) = grants.video {
            token = token.with_video_grant(video);
        }
        if let Some(sip) = grants.sip {
            token = token.with_sip_grant(sip);
        }

        let url = format!("{}/twirp/livekit.{}/{}", self.base_url, service, method);
        debug!(%url, "twirp request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token.to_jwt()?)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let error: TwirpErrorBody = serde_json::from_str(&text).unwrap_or_else(|_| TwirpErrorBody {
                code: "unknown".to_string(),
                msg: text,
            });
            return Err(LiveKitError::Twirp {
                status: status.as_u16(),
                code: error.code,
                msg: error.msg,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| LiveKitError::Decode(e.to_string()))
    }
}

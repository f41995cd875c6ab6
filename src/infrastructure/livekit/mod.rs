//! Client for the media platform's administrative API
//!
//! Requests are Twirp calls: JSON bodies posted to
//! `{url}/twirp/livekit.<Service>/<Method>` with a bearer access token.

pub mod client;
pub mod room_service;
pub mod sip;
pub mod token;

pub use client::LiveKitClient;
pub use token::{AccessToken, Claims, SipGrant, VideoGrant};

use crate::domain::shared::error::DomainError;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LiveKitError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("twirp error {code} (HTTP {status}): {msg}")]
    Twirp { status: u16, code: String, msg: String },

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("API key and secret are required")]
    Credentials,

    #[error("invalid response: {0}")]
    Decode(String),
}

/// Error body of a failed Twirp call
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwirpErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub msg: String,
}

impl From<LiveKitError> for DomainError {
    fn from(err: LiveKitError) -> Self {
        match &err {
            LiveKitError::Twirp { code, msg, .. } if code == "not_found" => {
                DomainError::NotFound(msg.clone())
            }
            LiveKitError::Twirp { code, msg, .. } if code == "invalid_argument" => {
                DomainError::ValidationError(msg.clone())
            }
            _ => DomainError::Platform(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twirp_errors_map_to_domain() {
        let not_found = LiveKitError::Twirp {
            status: 404,
            code: "not_found".to_string(),
            msg: "participant not found".to_string(),
        };
        assert_eq!(
            DomainError::from(not_found),
            DomainError::NotFound("participant not found".to_string())
        );

        let internal = LiveKitError::Twirp {
            status: 500,
            code: "internal".to_string(),
            msg: "boom".to_string(),
        };
        assert!(matches!(DomainError::from(internal), DomainError::Platform(_)));
    }
}

//! Speech and language model plugins
//!
//! Voice activity detection runs locally on PCM energy. Recognition,
//! completion, synthesis and the realtime model are remote APIs.

pub mod deepgram;
pub mod openai_llm;
pub mod openai_tts;
pub mod realtime;
pub mod vad;

pub use deepgram::DeepgramStt;
pub use openai_llm::OpenAiLlm;
pub use openai_tts::OpenAiTts;
pub use realtime::OpenAiRealtime;
pub use vad::EnergyVad;

use crate::domain::shared::error::DomainError;
use thiserror::Error;

/// Sample rate used for agent audio end to end
pub const AGENT_SAMPLE_RATE: u32 = 24_000;

pub(crate) const OPENAI_API_URL: &str = "https://api.openai.com/v1";

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<PluginError> for DomainError {
    fn from(err: PluginError) -> Self {
        DomainError::Platform(err.to_string())
    }
}

/// Turn a non-2xx response into [`PluginError::Api`]
pub(crate) async fn ensure_success(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, PluginError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(PluginError::Api {
        provider,
        status: status.as_u16(),
        message,
    })
}

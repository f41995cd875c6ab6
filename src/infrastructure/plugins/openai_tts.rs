//! OpenAI text-to-speech returning raw 24 kHz PCM

use super::{ensure_success, PluginError, AGENT_SAMPLE_RATE, OPENAI_API_URL};
use crate::domain::agent::TextToSpeech;
use crate::domain::room::AudioFrame;
use crate::domain::shared::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'static str,
}

#[derive(Clone)]
pub struct OpenAiTts {
    client: Client,
    api_key: String,
    model: String,
    voice: String,
    base_url: String,
}

impl OpenAiTts {
    pub fn new(api_key: &str, model: &str, voice: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            voice: voice.to_string(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub async fn speak(&self, text: &str) -> std::result::Result<AudioFrame, PluginError> {
        let request = SpeechRequest {
            model: &self.model,
            voice: &self.voice,
            input: text,
            response_format: "pcm",
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let pcm = ensure_success("OpenAI", response).await?.bytes().await?;
        Ok(AudioFrame::from_le_bytes(&pcm, AGENT_SAMPLE_RATE, 1))
    }
}

#[async_trait]
impl TextToSpeech for OpenAiTts {
    async fn synthesize(&self, text: &str) -> Result<AudioFrame> {
        Ok(self.speak(text).await?)
    }
}

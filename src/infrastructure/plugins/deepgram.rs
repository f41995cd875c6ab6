//! Deepgram speech-to-text over the pre-recorded REST endpoint

use super::{ensure_success, PluginError};
use crate::domain::agent::SpeechToText;
use crate::domain::room::AudioFrame;
use crate::domain::shared::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const DEEPGRAM_API_URL: &str = "https://api.deepgram.com/v1";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListenResponse {
    results: ListenResults,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListenResults {
    channels: Vec<ListenChannel>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListenChannel {
    alternatives: Vec<ListenAlternative>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListenAlternative {
    transcript: String,
}

impl ListenResponse {
    /// Best transcript of the first channel; empty when nothing was recognized
    pub fn transcript(&self) -> String {
        self.results
            .channels
            .first()
            .and_then(|channel| channel.alternatives.first())
            .map(|alt| alt.transcript.trim().to_string())
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct DeepgramStt {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl DeepgramStt {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: DEEPGRAM_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub async fn listen(&self, utterance: &AudioFrame) -> std::result::Result<String, PluginError> {
        let sample_rate = utterance.sample_rate.to_string();
        let channels = utterance.channels.to_string();
        let response = self
            .client
            .post(format!("{}/listen", self.base_url))
            .query(&[
                ("model", self.model.as_str()),
                ("encoding", "linear16"),
                ("sample_rate", sample_rate.as_str()),
                ("channels", channels.as_str()),
                ("smart_format", "true"),
            ])
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "application/octet-stream")
            .body(utterance.to_le_bytes())
            .send()
            .await?;

        let body: ListenResponse = ensure_success("Deepgram", response).await?.json().await?;
        let transcript = body.transcript();
        debug!(chars = transcript.len(), "utterance transcribed");
        Ok(transcript)
    }
}

#[async_trait]
impl SpeechToText for DeepgramStt {
    async fn transcribe(&self, utterance: &AudioFrame) -> Result<String> {
        Ok(self.listen(utterance).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_from_response() {
        let body: ListenResponse = serde_json::from_str(
            r#"{
                "metadata": {"request_id": "abc"},
                "results": {"channels": [{"alternatives": [
                    {"transcript": " yes, please call back tomorrow ", "confidence": 0.98}
                ]}]}
            }"#,
        )
        .unwrap();
        assert_eq!(body.transcript(), "yes, please call back tomorrow");
    }

    #[test]
    fn test_empty_results() {
        let body: ListenResponse = serde_json::from_str(r#"{"results": {"channels": []}}"#).unwrap();
        assert_eq!(body.transcript(), "");
    }
}

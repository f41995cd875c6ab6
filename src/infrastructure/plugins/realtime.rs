//! OpenAI realtime model over WebSocket
//!
//! The session is configured once with `session.update`: instructions,
//! modalities, voice, PCM16 audio both ways, server-side VAD and the tool
//! specs. Caller audio goes up as `input_audio_buffer.append`; audio deltas,
//! function calls and turn boundaries come back as events.

use super::{PluginError, AGENT_SAMPLE_RATE};
use crate::domain::agent::{
    RealtimeCommand, RealtimeConnection, RealtimeEvent, RealtimeModel, RealtimeSpec, ToolCall,
    ToolSpec,
};
use crate::domain::room::AudioFrame;
use crate::domain::shared::error::Result;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

const REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";
const CHANNEL_BUFFER: usize = 128;

/// `session.update` for `spec`
pub fn session_update(spec: &RealtimeSpec, tools: &[ToolSpec]) -> Value {
    let tools: Vec<Value> = tools
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            })
        })
        .collect();

    json!({
        "type": "session.update",
        "session": {
            "modalities": spec.modalities,
            "instructions": spec.instructions,
            "voice": spec.voice,
            "input_audio_format": "pcm16",
            "output_audio_format": "pcm16",
            "turn_detection": { "type": "server_vad" },
            "tools": tools,
            "tool_choice": "auto",
        }
    })
}

/// Client event for `command`; `None` for commands that close the session
pub fn encode_command(command: &RealtimeCommand) -> Option<Value> {
    match command {
        RealtimeCommand::AppendAudio(frame) => Some(json!({
            "type": "input_audio_buffer.append",
            "audio": frame.to_base64(),
        })),
        RealtimeCommand::ToolOutput { call_id, output } => Some(json!({
            "type": "conversation.item.create",
            "item": {
                "type": "function_call_output",
                "call_id": call_id,
                "output": output,
            }
        })),
        RealtimeCommand::CreateResponse => Some(json!({ "type": "response.create" })),
        RealtimeCommand::Close => None,
    }
}

/// Server event mapped to what the agent cares about
pub fn decode_event(text: &str) -> Option<RealtimeEvent> {
    let event: Value = serde_json::from_str(text).ok()?;
    let field = |name: &str| event.get(name).and_then(Value::as_str).unwrap_or_default();

    match field("type") {
        "response.audio.delta" => AudioFrame::from_base64(field("delta"), AGENT_SAMPLE_RATE, 1)
            .ok()
            .map(RealtimeEvent::AudioDelta),
        "input_audio_buffer.speech_started" => Some(RealtimeEvent::SpeechStarted),
        "response.function_call_arguments.done" => Some(RealtimeEvent::ToolCall(ToolCall {
            id: field("call_id").to_string(),
            name: field("name").to_string(),
            arguments: field("arguments").to_string(),
        })),
        "response.done" => Some(RealtimeEvent::ResponseDone),
        "error" => Some(RealtimeEvent::Error(
            event
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown realtime error")
                .to_string(),
        )),
        _ => None,
    }
}

#[derive(Clone)]
pub struct OpenAiRealtime {
    api_key: String,
    url: String,
}

impl OpenAiRealtime {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            url: REALTIME_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    async fn open(
        &self,
        spec: &RealtimeSpec,
        tools: &[ToolSpec],
    ) -> std::result::Result<RealtimeConnection, PluginError> {
        let mut request = format!("{}?model={}", self.url, spec.model).into_client_request()?;
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| PluginError::Protocol(format!("invalid API key header: {}", e)))?;
        request.headers_mut().insert("Authorization", auth);
        request
            .headers_mut()
            .insert("OpenAI-Beta", HeaderValue::from_static("realtime=v1"));

        let (socket, _) = tokio_tungstenite::connect_async(request).await?;
        let (mut sink, mut stream) = socket.split();

        sink.send(Message::Text(session_update(spec, tools).to_string()))
            .await?;
        debug!(model = %spec.model, tools = tools.len(), "realtime session configured");

        let (commands, mut command_rx) = mpsc::channel::<RealtimeCommand>(CHANNEL_BUFFER);
        let (event_tx, events) = mpsc::channel::<RealtimeEvent>(CHANNEL_BUFFER);

        tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                let Some(payload) = encode_command(&command) else {
                    break;
                };
                if let Err(e) = sink.send(Message::Text(payload.to_string())).await {
                    warn!("realtime write failed: {}", e);
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(message) = stream.next().await {
                let text = match message {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        let _ = event_tx.send(RealtimeEvent::Error(e.to_string())).await;
                        break;
                    }
                };
                if let Some(event) = decode_event(&text) {
                    if event_tx.send(event).await.is_err() {
                        break;
                    }
                }
            }
        });

        Ok(RealtimeConnection { commands, events })
    }
}

#[async_trait]
impl RealtimeModel for OpenAiRealtime {
    async fn connect(&self, spec: &RealtimeSpec, tools: &[ToolSpec]) -> Result<RealtimeConnection> {
        Ok(self.open(spec, tools).await?)
    }
}

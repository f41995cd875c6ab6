//! Speech and language model ports used by the agent runners

use crate::domain::agent::chat::{ChatContext, ToolCall};
use crate::domain::agent::spec::RealtimeSpec;
use crate::domain::agent::tool::ToolSpec;
use crate::domain::room::AudioFrame;
use crate::domain::shared::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

/// Tuning for voice-activity detection
#[derive(Debug, Clone, PartialEq)]
pub struct VadOptions {
    /// RMS level (0.0..=1.0 of full scale) above which a frame counts as speech
    pub activation_threshold: f32,
    /// Speech shorter than this is discarded as noise
    pub min_speech: Duration,
    /// Silence that closes an utterance
    pub min_silence: Duration,
    /// Utterances are cut at this length
    pub max_utterance: Duration,
}

impl Default for VadOptions {
    fn default() -> Self {
        Self {
            activation_threshold: 0.02,
            min_speech: Duration::from_millis(200),
            min_silence: Duration::from_millis(550),
            max_utterance: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VadEvent {
    SpeechStarted,
    /// A complete utterance, including its trailing silence
    SpeechEnded(AudioFrame),
}

pub trait VoiceActivityDetector: Send {
    fn push(&mut self, frame: &AudioFrame) -> Option<VadEvent>;
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, utterance: &AudioFrame) -> Result<String>;
}

/// One completion: either text for the caller or tool calls to run first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LlmReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn chat(&self, context: &ChatContext, tools: &[ToolSpec]) -> Result<LlmReply>;
}

#[async_trait]
pub trait TextToSpeech: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioFrame>;
}

/// Commands sent to a running realtime session
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeCommand {
    AppendAudio(AudioFrame),
    ToolOutput { call_id: String, output: String },
    CreateResponse,
    Close,
}

/// Events emitted by a running realtime session
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    AudioDelta(AudioFrame),
    /// The caller started talking over the agent
    SpeechStarted,
    ToolCall(ToolCall),
    ResponseDone,
    Error(String),
}

/// Live realtime session; dropping `commands` closes it
#[derive(Debug)]
pub struct RealtimeConnection {
    pub commands: mpsc::Sender<RealtimeCommand>,
    pub events: mpsc::Receiver<RealtimeEvent>,
}

#[async_trait]
pub trait RealtimeModel: Send + Sync {
    async fn connect(&self, spec: &RealtimeSpec, tools: &[ToolSpec]) -> Result<RealtimeConnection>;
}

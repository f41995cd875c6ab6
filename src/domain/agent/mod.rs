//! Agent bounded context - voice agents, the tools they can call and the
//! speech/model plugins they are assembled from

pub mod chat;
pub mod runtime;
pub mod spec;
pub mod speech;
pub mod tool;

pub use chat::{ChatContext, ChatMessage, ChatRole, ToolCall};
pub use runtime::{AgentContext, AgentHandle, AgentRuntime};
pub use spec::{AgentSpec, Modality, PipelineSpec, RealtimeSpec, RunnerKind};
pub use speech::{
    LanguageModel, LlmReply, RealtimeCommand, RealtimeConnection, RealtimeEvent, RealtimeModel,
    SpeechToText, TextToSpeech, VadEvent, VadOptions, VoiceActivityDetector,
};
pub use tool::{Tool, ToolRegistry, ToolSpec};

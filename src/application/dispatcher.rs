//! Agent dispatcher - picks the runner strategy and starts it for a call

use crate::config::AgentConfig;
use crate::domain::agent::{
    AgentContext, AgentHandle, AgentRuntime, AgentSpec, ChatContext, ChatMessage, Modality,
    PipelineSpec, RealtimeSpec, RunnerKind, VadOptions,
};
use crate::domain::shared::error::Result;
use std::sync::Arc;
use tracing::info;

pub struct AgentDispatcher {
    runtime: Arc<dyn AgentRuntime>,
    config: AgentConfig,
}

impl AgentDispatcher {
    pub fn new(runtime: Arc<dyn AgentRuntime>, config: AgentConfig) -> Self {
        Self { runtime, config }
    }

    pub fn runner(&self) -> RunnerKind {
        self.config.runner
    }

    /// Runner settings for a call carrying `instructions`
    pub fn build_spec(&self, instructions: &str) -> AgentSpec {
        match self.config.runner {
            RunnerKind::Pipeline => AgentSpec::Pipeline(PipelineSpec {
                vad: VadOptions::default(),
                stt_model: self.config.stt_model.clone(),
                llm_model: self.config.llm_model.clone(),
                tts_model: self.config.tts_model.clone(),
                tts_voice: self.config.tts_voice.clone(),
                chat_context: ChatContext::new().append(ChatMessage::system(instructions)),
            }),
            RunnerKind::Realtime => AgentSpec::Realtime(RealtimeSpec {
                model: self.config.realtime_model.clone(),
                instructions: instructions.to_string(),
                modalities: vec![Modality::Audio, Modality::Text],
                voice: self.config.realtime_voice.clone(),
            }),
        }
    }

    /// Start the configured runner bound to `ctx`. Returns as soon as it is running.
    pub fn dispatch(&self, ctx: AgentContext, instructions: &str) -> Result<AgentHandle> {
        let spec = self.build_spec(instructions);
        match spec.kind() {
            RunnerKind::Pipeline => info!("Starting: voice pipeline agent"),
            RunnerKind::Realtime => info!("Starting: multimodal agent"),
        }
        self.runtime.start(spec, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::FakeRoom;
    use crate::domain::agent::{ChatRole, ToolRegistry};
    use crate::domain::call::{CallSessionControl, ParticipantState, RemoteParticipant};
    use crate::domain::shared::value_objects::ParticipantIdentity;
    use std::sync::Mutex;
    use tokio::sync::watch;

    fn agent_config(runner: RunnerKind) -> AgentConfig {
        AgentConfig {
            runner,
            openai_api_key: "sk-test".to_string(),
            deepgram_api_key: Some("dg-test".to_string()),
            realtime_model: "gpt-4o-realtime-preview".to_string(),
            realtime_voice: "alloy".to_string(),
            llm_model: "gpt-4o".to_string(),
            stt_model: "nova-2-phonecall".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
        }
    }

    #[derive(Default)]
    struct RecordingRuntime {
        started: Mutex<Vec<AgentSpec>>,
    }

    impl AgentRuntime for RecordingRuntime {
        fn start(&self, spec: AgentSpec, ctx: AgentContext) -> Result<AgentHandle> {
            let kind = spec.kind();
            self.started.lock().unwrap().push(spec);
            let control = ctx.control.clone();
            Ok(AgentHandle::new(
                kind,
                tokio::spawn(async move { control.cancelled().await }),
            ))
        }
    }

    #[test]
    fn test_pipeline_spec_is_seeded_with_instructions() {
        let dispatcher = AgentDispatcher::new(
            Arc::new(RecordingRuntime::default()),
            agent_config(RunnerKind::Pipeline),
        );

        let AgentSpec::Pipeline(spec) = dispatcher.build_spec("Be polite.") else {
            panic!("expected a pipeline spec");
        };
        assert_eq!(spec.stt_model, "nova-2-phonecall");
        let first = &spec.chat_context.messages()[0];
        assert_eq!(first.role, ChatRole::System);
        assert_eq!(first.content.as_deref(), Some("Be polite."));
    }

    #[test]
    fn test_realtime_spec_uses_audio_and_text() {
        let dispatcher = AgentDispatcher::new(
            Arc::new(RecordingRuntime::default()),
            agent_config(RunnerKind::Realtime),
        );

        let AgentSpec::Realtime(spec) = dispatcher.build_spec("") else {
            panic!("expected a realtime spec");
        };
        assert_eq!(spec.modalities, vec![Modality::Audio, Modality::Text]);
        assert_eq!(spec.instructions, "");
    }

    #[tokio::test]
    async fn test_dispatch_does_not_block() {
        let runtime = Arc::new(RecordingRuntime::default());
        let dispatcher = AgentDispatcher::new(runtime.clone(), agent_config(RunnerKind::Realtime));

        let (_tx, rx) = watch::channel(ParticipantState::default());
        let control = Arc::new(CallSessionControl::new());
        let ctx = AgentContext {
            room: Arc::new(FakeRoom::new("call-1")),
            participant: RemoteParticipant::new(ParticipantIdentity::new("phone_user"), rx),
            tools: ToolRegistry::new(),
            control: control.clone(),
        };

        let handle = dispatcher.dispatch(ctx, "hi").unwrap();
        assert_eq!(handle.kind(), RunnerKind::Realtime);
        assert!(!handle.is_finished());
        assert_eq!(runtime.started.lock().unwrap().len(), 1);

        control.shutdown(crate::domain::call::ShutdownReason::EndCall);
        handle.join().await;
    }
}

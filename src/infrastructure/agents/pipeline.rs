//! Turn-based voice pipeline: VAD, speech-to-text, LLM with tools, text-to-speech

use super::publish_chunked;
use crate::domain::agent::{
    AgentContext, ChatContext, ChatMessage, LanguageModel, SpeechToText, TextToSpeech, VadEvent,
    VoiceActivityDetector,
};
use crate::domain::room::{AudioFrame, InboundAudio};
use crate::domain::shared::error::Result;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Model rounds allowed per utterance before giving up on tool calls
const MAX_TOOL_ROUNDS: usize = 4;

pub struct PipelineAgent {
    vad: Box<dyn VoiceActivityDetector>,
    stt: Arc<dyn SpeechToText>,
    llm: Arc<dyn LanguageModel>,
    tts: Arc<dyn TextToSpeech>,
    chat: ChatContext,
}

impl PipelineAgent {
    pub fn new(
        vad: Box<dyn VoiceActivityDetector>,
        stt: Arc<dyn SpeechToText>,
        llm: Arc<dyn LanguageModel>,
        tts: Arc<dyn TextToSpeech>,
        chat: ChatContext,
    ) -> Self {
        Self {
            vad,
            stt,
            llm,
            tts,
            chat,
        }
    }

    pub fn chat_context(&self) -> &ChatContext {
        &self.chat
    }

    /// Run until the session ends or the room stops delivering audio
    pub async fn run(mut self, ctx: AgentContext) {
        let mut audio = ctx.room.subscribe_audio();
        info!(identity = %ctx.participant.identity(), "pipeline agent started");

        loop {
            let received = tokio::select! {
                _ = ctx.control.cancelled() => break,
                received = audio.recv() => received,
            };

            let InboundAudio { identity, frame } = match received {
                Ok(inbound) => inbound,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "pipeline agent fell behind on audio");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            if &identity != ctx.participant.identity() {
                continue;
            }

            match self.vad.push(&frame) {
                Some(VadEvent::SpeechStarted) => debug!("user started speaking"),
                Some(VadEvent::SpeechEnded(utterance)) => {
                    if let Err(e) = self.respond(&ctx, utterance).await {
                        warn!("pipeline turn failed: {}", e);
                    }
                }
                None => {}
            }
        }

        info!("pipeline agent stopped");
    }

    /// Answer one utterance
    pub async fn respond(&mut self, ctx: &AgentContext, utterance: AudioFrame) -> Result<()> {
        let text = self.stt.transcribe(&utterance).await?;
        if text.is_empty() {
            return Ok(());
        }
        debug!(%text, "user said");
        self.chat.push(ChatMessage::user(&text));

        let tools = ctx.tools.specs();
        for _ in 0..MAX_TOOL_ROUNDS {
            let reply = self.llm.chat(&self.chat, &tools).await?;

            if reply.tool_calls.is_empty() {
                if let Some(content) = reply.content {
                    self.chat.push(ChatMessage::assistant(&content));
                    let speech = self.tts.synthesize(&content).await?;
                    publish_chunked(ctx.room.as_ref(), speech, &ctx.control).await?;
                }
                return Ok(());
            }

            self.chat
                .push(ChatMessage::assistant_tool_calls(reply.tool_calls.clone()));
            for call in reply.tool_calls {
                let output = match ctx.tools.invoke(&call.name, &call.arguments).await {
                    Ok(output) => output,
                    Err(e) => e.to_string(),
                };
                self.chat.push(ChatMessage::tool_result(&call.id, &output));
            }

            if ctx.control.is_shut_down() {
                return Ok(());
            }
        }

        warn!("tool round limit reached");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::FakeRoom;
    use crate::domain::agent::{ChatRole, LlmReply, Tool, ToolCall, ToolRegistry, ToolSpec};
    use crate::domain::call::{CallSessionControl, ParticipantState, RemoteParticipant, ShutdownReason};
    use crate::domain::shared::value_objects::ParticipantIdentity;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::watch;

    struct EveryFrameVad;

    impl VoiceActivityDetector for EveryFrameVad {
        fn push(&mut self, frame: &AudioFrame) -> Option<VadEvent> {
            Some(VadEvent::SpeechEnded(frame.clone()))
        }
    }

    struct FixedStt(&'static str);

    #[async_trait]
    impl SpeechToText for FixedStt {
        async fn transcribe(&self, _utterance: &AudioFrame) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct ScriptedLlm(Mutex<VecDeque<LlmReply>>);

    #[async_trait]
    impl LanguageModel for ScriptedLlm {
        async fn chat(&self, _context: &ChatContext, _tools: &[ToolSpec]) -> Result<LlmReply> {
            Ok(self.0.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    struct ToneTts;

    #[async_trait]
    impl TextToSpeech for ToneTts {
        async fn synthesize(&self, _text: &str) -> Result<AudioFrame> {
            // 250 ms at 24 kHz
            Ok(AudioFrame::new(vec![100; 6_000], 24_000, 1))
        }
    }

    struct NoteTool;

    #[async_trait]
    impl Tool for NoteTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec::without_parameters("take_note", "Record a note.")
        }

        async fn invoke(&self, _arguments: serde_json::Value) -> String {
            "noted".to_string()
        }
    }

    fn context(room: Arc<FakeRoom>) -> AgentContext {
        let (_, rx) = watch::channel(ParticipantState::default());
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(NoteTool)).unwrap();
        AgentContext {
            room,
            participant: RemoteParticipant::new(ParticipantIdentity::new("phone_user"), rx),
            tools,
            control: Arc::new(CallSessionControl::new()),
        }
    }

    fn agent(replies: Vec<LlmReply>) -> PipelineAgent {
        PipelineAgent::new(
            Box::new(EveryFrameVad),
            Arc::new(FixedStt("please write that down")),
            Arc::new(ScriptedLlm(Mutex::new(replies.into()))),
            Arc::new(ToneTts),
            ChatContext::new().append(ChatMessage::system("Be brief.")),
        )
    }

    #[tokio::test]
    async fn test_tool_round_then_spoken_reply() {
        let room = Arc::new(FakeRoom::new("call-1"));
        let ctx = context(room.clone());
        let mut agent = agent(vec![
            LlmReply {
                content: None,
                tool_calls: vec![ToolCall {
                    id: "call_1".to_string(),
                    name: "take_note".to_string(),
                    arguments: String::new(),
                }],
            },
            LlmReply {
                content: Some("Done.".to_string()),
                tool_calls: Vec::new(),
            },
        ]);

        agent
            .respond(&ctx, AudioFrame::new(vec![0; 480], 24_000, 1))
            .await
            .unwrap();

        let roles: Vec<ChatRole> = agent.chat_context().messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                ChatRole::System,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::Tool,
                ChatRole::Assistant
            ]
        );
        assert_eq!(
            agent.chat_context().messages()[3].content.as_deref(),
            Some("noted")
        );

        // 250 ms published as 100 ms chunks
        let published = room.published();
        assert_eq!(published.len(), 3);
        assert_eq!(published.iter().map(|f| f.samples.len()).sum::<usize>(), 6_000);
    }

    #[tokio::test]
    async fn test_unknown_tool_reports_back_to_model() {
        let room = Arc::new(FakeRoom::new("call-1"));
        let ctx = context(room.clone());
        let mut agent = agent(vec![LlmReply {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: "transfer_call".to_string(),
                arguments: "{}".to_string(),
            }],
        }]);

        agent
            .respond(&ctx, AudioFrame::new(vec![0; 480], 24_000, 1))
            .await
            .unwrap();

        let last = agent.chat_context().messages().last().unwrap();
        assert_eq!(last.role, ChatRole::Tool);
        assert!(last.content.as_deref().unwrap().contains("transfer_call"));
        assert!(room.published().is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let room = Arc::new(FakeRoom::new("call-1"));
        let ctx = context(room.clone());
        let control = ctx.control.clone();

        let task = tokio::spawn(agent(Vec::new()).run(ctx));
        control.shutdown(ShutdownReason::EndCall);
        task.await.unwrap();
    }
}

//! `AgentRuntime` backed by the speech and model plugins

use super::{MultimodalAgent, PipelineAgent};
use crate::config::AgentConfig;
use crate::domain::agent::{AgentContext, AgentHandle, AgentRuntime, AgentSpec, PipelineSpec};
use crate::domain::call::ShutdownReason;
use crate::domain::shared::error::{DomainError, Result};
use crate::infrastructure::plugins::{DeepgramStt, EnergyVad, OpenAiLlm, OpenAiRealtime, OpenAiTts};
use std::sync::Arc;
use tracing::error;

pub struct PluginAgentRuntime {
    config: AgentConfig,
}

impl PluginAgentRuntime {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    fn pipeline(&self, spec: PipelineSpec) -> Result<PipelineAgent> {
        let deepgram_key = self.config.deepgram_api_key.as_deref().ok_or_else(|| {
            DomainError::ValidationError("DEEPGRAM_API_KEY is required for the pipeline runner".to_string())
        })?;

        Ok(PipelineAgent::new(
            Box::new(EnergyVad::new(spec.vad)),
            Arc::new(DeepgramStt::new(deepgram_key, &spec.stt_model)),
            Arc::new(OpenAiLlm::new(&self.config.openai_api_key, &spec.llm_model)),
            Arc::new(OpenAiTts::new(
                &self.config.openai_api_key,
                &spec.tts_model,
                &spec.tts_voice,
            )),
            spec.chat_context,
        ))
    }
}

impl AgentRuntime for PluginAgentRuntime {
    fn start(&self, spec: AgentSpec, ctx: AgentContext) -> Result<AgentHandle> {
        let kind = spec.kind();
        let control = ctx.control.clone();

        let task = match spec {
            AgentSpec::Pipeline(spec) => {
                let agent = self.pipeline(spec)?;
                tokio::spawn(async move {
                    agent.run(ctx).await;
                    control.shutdown(ShutdownReason::AgentStopped);
                })
            }
            AgentSpec::Realtime(spec) => {
                let model = Arc::new(OpenAiRealtime::new(&self.config.openai_api_key));
                let agent = MultimodalAgent::new(model, spec);
                tokio::spawn(async move {
                    if let Err(e) = agent.run(ctx).await {
                        error!("multimodal agent failed: {}", e);
                    }
                    control.shutdown(ShutdownReason::AgentStopped);
                })
            }
        };

        Ok(AgentHandle::new(kind, task))
    }
}

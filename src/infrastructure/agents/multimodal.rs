//! Realtime multimodal agent: caller audio in, model audio and tool calls out

use crate::domain::agent::{
    AgentContext, RealtimeCommand, RealtimeConnection, RealtimeEvent, RealtimeModel, RealtimeSpec,
};
use crate::domain::shared::error::Result;
use crate::infrastructure::plugins::AGENT_SAMPLE_RATE;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

pub struct MultimodalAgent {
    model: Arc<dyn RealtimeModel>,
    spec: RealtimeSpec,
}

impl MultimodalAgent {
    pub fn new(model: Arc<dyn RealtimeModel>, spec: RealtimeSpec) -> Self {
        Self { model, spec }
    }

    /// Run until the session ends, the room stops delivering audio or the model hangs up
    pub async fn run(self, ctx: AgentContext) -> Result<()> {
        let RealtimeConnection {
            commands,
            mut events,
        } = self.model.connect(&self.spec, &ctx.tools.specs()).await?;
        let mut audio = ctx.room.subscribe_audio();
        info!(model = %self.spec.model, "multimodal agent started");

        loop {
            tokio::select! {
                _ = ctx.control.cancelled() => break,

                received = audio.recv() => match received {
                    Ok(inbound) if &inbound.identity == ctx.participant.identity() => {
                        // The session takes 24 kHz mono PCM16 only
                        let frame = inbound.frame.resampled(AGENT_SAMPLE_RATE);
                        if commands.send(RealtimeCommand::AppendAudio(frame)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "multimodal agent fell behind on audio");
                    }
                    Err(RecvError::Closed) => break,
                },

                event = events.recv() => match event {
                    Some(RealtimeEvent::AudioDelta(frame)) => {
                        if let Err(e) = ctx.room.publish_audio(frame).await {
                            warn!("failed to publish agent audio: {}", e);
                            break;
                        }
                    }
                    Some(RealtimeEvent::ToolCall(call)) => {
                        debug!(tool = %call.name, "model called a tool");
                        let output = match ctx.tools.invoke(&call.name, &call.arguments).await {
                            Ok(output) => output,
                            Err(e) => e.to_string(),
                        };
                        if ctx.control.is_shut_down() {
                            break;
                        }
                        let result = RealtimeCommand::ToolOutput { call_id: call.id, output };
                        if commands.send(result).await.is_err()
                            || commands.send(RealtimeCommand::CreateResponse).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(RealtimeEvent::SpeechStarted) => debug!("user started speaking"),
                    Some(RealtimeEvent::ResponseDone) => debug!("response done"),
                    Some(RealtimeEvent::Error(message)) => warn!("realtime model error: {}", message),
                    None => {
                        info!("realtime session closed");
                        break;
                    }
                },
            }
        }

        let _ = commands.send(RealtimeCommand::Close).await;
        info!("multimodal agent stopped");
        Ok(())
    }
}

//! Agent runners and the runtime that assembles them from plugins

pub mod multimodal;
pub mod pipeline;
pub mod runtime;

pub use multimodal::MultimodalAgent;
pub use pipeline::PipelineAgent;
pub use runtime::PluginAgentRuntime;

use crate::domain::call::CallSessionControl;
use crate::domain::room::{AudioFrame, Room};
use crate::domain::shared::error::Result;
use std::time::Duration;

/// Size of the pieces synthesized speech is published in
const PUBLISH_CHUNK: Duration = Duration::from_millis(100);

/// Publish `frame` in short chunks, stopping early once the session ends
pub(crate) async fn publish_chunked(
    room: &dyn Room,
    frame: AudioFrame,
    control: &CallSessionControl,
) -> Result<()> {
    let per_chunk = (frame.sample_rate as u64 * PUBLISH_CHUNK.as_millis() as u64 / 1000) as usize
        * frame.channels.max(1) as usize;
    if per_chunk == 0 {
        return room.publish_audio(frame).await;
    }

    for chunk in frame.samples.chunks(per_chunk) {
        if control.is_shut_down() {
            break;
        }
        room.publish_audio(AudioFrame::new(chunk.to_vec(), frame.sample_rate, frame.channels))
            .await?;
    }
    Ok(())
}

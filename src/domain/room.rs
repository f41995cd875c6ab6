//! Room port - the live connection to a room on the media platform
//!
//! Media transport is owned by the platform. This crate only sees
//! participant snapshots and PCM audio frames going in and out.

use crate::domain::call::RemoteParticipant;
use crate::domain::shared::error::{DomainError, Result};
use crate::domain::shared::value_objects::{ParticipantIdentity, RoomName};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Which remote tracks the room connection subscribes to automatically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoSubscribe {
    SubscribeAll,
    SubscribeNone,
    AudioOnly,
    VideoOnly,
}

/// Block of interleaved signed 16-bit PCM samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFrame {
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 || self.channels == 0 {
            return Duration::ZERO;
        }
        let per_channel = self.samples.len() as u64 / self.channels as u64;
        Duration::from_micros(per_channel * 1_000_000 / self.sample_rate as u64)
    }

    /// Little-endian byte representation
    /// Mono copy of the frame at `sample_rate`, linearly interpolated
    pub fn resampled(&self, sample_rate: u32) -> AudioFrame {
        let channels = self.channels.max(1) as usize;
        let mono: Vec<i16> = if channels == 1 {
            self.samples.clone()
        } else {
            self.samples
                .chunks_exact(channels)
                .map(|frame| {
                    let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                    (sum / channels as i32) as i16
                })
                .collect()
        };

        if self.sample_rate == sample_rate || self.sample_rate == 0 || mono.is_empty() {
            return Self::new(mono, sample_rate, 1);
        }

        let out_len = (mono.len() as u64 * sample_rate as u64 / self.sample_rate as u64) as usize;
        let last = mono.len() - 1;
        let samples = (0..out_len)
            .map(|i| {
                let pos = (i as u64 * self.sample_rate as u64) as f64 / sample_rate as f64;
                let idx = (pos as usize).min(last);
                let next = (idx + 1).min(last);
                let frac = pos - idx as f64;
                let a = mono[idx] as f64;
                let b = mono[next] as f64;
                (a + (b - a) * frac).round() as i16
            })
            .collect();
        Self::new(samples, sample_rate, 1)
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.samples.len() * 2);
        for sample in &self.samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    /// Build a frame from little-endian PCM bytes; a trailing odd byte is dropped
    pub fn from_le_bytes(bytes: &[u8], sample_rate: u32, channels: u16) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self::new(samples, sample_rate, channels)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_le_bytes())
    }

    pub fn from_base64(data: &str, sample_rate: u32, channels: u16) -> Result<Self> {
        let bytes = STANDARD
            .decode(data)
            .map_err(|e| DomainError::ValidationError(format!("invalid audio payload: {}", e)))?;
        Ok(Self::from_le_bytes(&bytes, sample_rate, channels))
    }
}

/// Audio received from a remote participant
#[derive(Debug, Clone)]
pub struct InboundAudio {
    pub identity: ParticipantIdentity,
    pub frame: AudioFrame,
}

/// Connected room
#[async_trait]
pub trait Room: Send + Sync {
    fn name(&self) -> &RoomName;

    /// Wait until a participant with `identity` is present in the room
    async fn wait_for_participant(&self, identity: &ParticipantIdentity)
        -> Result<RemoteParticipant>;

    /// Subscribe to audio from every remote participant
    fn subscribe_audio(&self) -> broadcast::Receiver<InboundAudio>;

    /// Publish agent audio into the room
    async fn publish_audio(&self, frame: AudioFrame) -> Result<()>;

    /// Resolves once the connection to the room is gone
    async fn closed(&self);

    /// Leave the room. Calling it more than once is a no-op.
    async fn disconnect(&self);
}

/// Opens room connections for jobs
#[async_trait]
pub trait RoomConnector: Send + Sync {
    async fn connect(&self, room: &RoomName, subscribe: AutoSubscribe) -> Result<Arc<dyn Room>>;
}

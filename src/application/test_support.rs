//! In-memory room used by the application unit tests

use crate::domain::call::{DisconnectReason, ParticipantState, RemoteParticipant};
use crate::domain::room::{AudioFrame, InboundAudio, Room};
use crate::domain::shared::error::{DomainError, Result};
use crate::domain::shared::value_objects::{ParticipantIdentity, RoomName};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

pub struct FakeRoom {
    name: RoomName,
    participants: Mutex<HashMap<String, watch::Sender<ParticipantState>>>,
    roster: watch::Sender<usize>,
    audio: broadcast::Sender<InboundAudio>,
    published: Mutex<Vec<AudioFrame>>,
    closed: CancellationToken,
    disconnects: AtomicUsize,
}

impl FakeRoom {
    pub fn new(name: &str) -> Self {
        let (roster, _) = watch::channel(0);
        let (audio, _) = broadcast::channel(64);
        Self {
            name: RoomName::parse(name).unwrap(),
            participants: Mutex::new(HashMap::new()),
            roster,
            audio,
            published: Mutex::new(Vec::new()),
            closed: CancellationToken::new(),
            disconnects: AtomicUsize::new(0),
        }
    }

    pub fn join(&self, identity: &str) {
        let (tx, _) = watch::channel(ParticipantState::joined(&ParticipantIdentity::new(identity)));
        self.participants
            .lock()
            .unwrap()
            .insert(identity.to_string(), tx);
        self.roster.send_modify(|count| *count += 1);
    }

    pub fn set_attribute(&self, identity: &str, key: &str, value: &str) {
        if let Some(tx) = self.participants.lock().unwrap().get(identity) {
            tx.send_modify(|state| {
                state.attributes.insert(key.to_string(), value.to_string());
            });
        }
    }

    pub fn leave(&self, identity: &str, reason: DisconnectReason) {
        if let Some(tx) = self.participants.lock().unwrap().get(identity) {
            tx.send_modify(|state| {
                state.disconnect_reason = Some(reason);
                state.connected = false;
            });
        }
    }

    pub fn push_audio(&self, identity: &str, frame: AudioFrame) {
        let _ = self.audio.send(InboundAudio {
            identity: ParticipantIdentity::new(identity),
            frame,
        });
    }

    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn published(&self) -> Vec<AudioFrame> {
        self.published.lock().unwrap().clone()
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    fn state_of(&self, identity: &ParticipantIdentity) -> Option<watch::Receiver<ParticipantState>> {
        self.participants
            .lock()
            .unwrap()
            .get(identity.as_str())
            .map(|tx| tx.subscribe())
    }
}

#[async_trait]
impl Room for FakeRoom {
    fn name(&self) -> &RoomName {
        &self.name
    }

    async fn wait_for_participant(&self, identity: &ParticipantIdentity) -> Result<RemoteParticipant> {
        let mut roster = self.roster.subscribe();
        loop {
            if let Some(state) = self.state_of(identity) {
                return Ok(RemoteParticipant::new(identity.clone(), state));
            }
            tokio::select! {
                _ = roster.changed() => {}
                _ = self.closed.cancelled() => {
                    return Err(DomainError::InvalidOperation("room closed".to_string()));
                }
            }
        }
    }

    fn subscribe_audio(&self) -> broadcast::Receiver<InboundAudio> {
        self.audio.subscribe()
    }

    async fn publish_audio(&self, frame: AudioFrame) -> Result<()> {
        self.published.lock().unwrap().push(frame);
        Ok(())
    }

    async fn closed(&self) {
        self.closed.cancelled().await
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.closed.cancel();
    }
}

//! Room connection over a WebSocket media bridge
//!
//! The platform's own rooms speak WebRTC signaling. The worker does not link a
//! WebRTC stack; it talks to a bridge service that joins the room on its
//! behalf and exchanges the JSON signals in [`super::signal`]. The bridge is a
//! separate deployment and is located with `ROOM_RELAY_URL`.

use super::signal::{ClientSignal, ServerSignal};
use crate::config::LiveKitConfig;
use crate::domain::call::{ParticipantState, RemoteParticipant};
use crate::domain::room::{AudioFrame, AutoSubscribe, InboundAudio, Room, RoomConnector};
use crate::domain::shared::error::{DomainError, Result};
use crate::domain::shared::value_objects::{ParticipantIdentity, RoomName};
use crate::infrastructure::livekit::{AccessToken, VideoGrant};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const AUDIO_BUFFER: usize = 256;
const OUTGOING_BUFFER: usize = 64;

/// Identity the worker joins rooms with
pub const AGENT_IDENTITY: &str = "outbound-caller-agent";

/// Participant roster and event fan-out of one room
///
/// Applying relay signals is kept separate from the socket so it can be
/// driven directly.
pub struct RoomState {
    participants: Mutex<HashMap<String, watch::Sender<ParticipantState>>>,
    roster: watch::Sender<u64>,
    audio: broadcast::Sender<InboundAudio>,
    closed: CancellationToken,
}

impl Default for RoomState {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomState {
    pub fn new() -> Self {
        let (roster, _) = watch::channel(0);
        let (audio, _) = broadcast::channel(AUDIO_BUFFER);
        Self {
            participants: Mutex::new(HashMap::new()),
            roster,
            audio,
            closed: CancellationToken::new(),
        }
    }

    pub fn apply(&self, signal: ServerSignal) {
        match signal {
            ServerSignal::ParticipantJoined {
                identity,
                attributes,
            } => {
                debug!(%identity, "participant joined");
                let state = ParticipantState {
                    identity: identity.clone(),
                    attributes,
                    disconnect_reason: None,
                    connected: true,
                };
                if let Ok(mut participants) = self.participants.lock() {
                    match participants.get(&identity) {
                        // A rejoin keeps existing handles current
                        Some(tx) => {
                            tx.send_replace(state);
                        }
                        None => {
                            let (tx, _) = watch::channel(state);
                            participants.insert(identity, tx);
                        }
                    }
                }
                self.roster.send_modify(|version| *version += 1);
            }
            ServerSignal::ParticipantUpdated {
                identity,
                attributes,
            } => {
                self.update(&identity, |state| state.attributes = attributes);
            }
            ServerSignal::ParticipantLeft {
                identity,
                disconnect_reason,
            } => {
                debug!(%identity, reason = ?disconnect_reason, "participant left");
                self.update(&identity, |state| {
                    state.disconnect_reason = disconnect_reason;
                    state.connected = false;
                });
            }
            ServerSignal::Audio {
                identity,
                data,
                sample_rate,
            } => match AudioFrame::from_base64(&data, sample_rate, 1) {
                Ok(frame) => {
                    // No subscribers is fine
                    let _ = self.audio.send(InboundAudio {
                        identity: ParticipantIdentity::new(identity),
                        frame,
                    });
                }
                Err(e) => warn!(%identity, "dropping audio: {}", e),
            },
            ServerSignal::RoomClosed => {
                info!("room closed by the platform");
                self.closed.cancel();
            }
        }
    }

    fn update(&self, identity: &str, change: impl FnOnce(&mut ParticipantState)) {
        let Ok(participants) = self.participants.lock() else {
            return;
        };
        match participants.get(identity) {
            Some(tx) => {
                tx.send_modify(change);
            }
            None => debug!(%identity, "update for unknown participant"),
        }
    }

    pub fn participant(&self, identity: &ParticipantIdentity) -> Option<RemoteParticipant> {
        let participants = self.participants.lock().ok()?;
        participants
            .get(identity.as_str())
            .map(|tx| RemoteParticipant::new(identity.clone(), tx.subscribe()))
    }

    pub async fn wait_for_participant(&self, identity: &ParticipantIdentity) -> Result<RemoteParticipant> {
        let mut roster = self.roster.subscribe();
        loop {
            if let Some(participant) = self.participant(identity) {
                return Ok(participant);
            }
            tokio::select! {
                changed = roster.changed() => {
                    if changed.is_err() {
                        return Err(DomainError::Internal("room roster dropped".to_string()));
                    }
                }
                _ = self.closed.cancelled() => {
                    return Err(DomainError::InvalidOperation(format!(
                        "room closed before participant '{}' joined",
                        identity
                    )));
                }
            }
        }
    }

    pub fn subscribe_audio(&self) -> broadcast::Receiver<InboundAudio> {
        self.audio.subscribe()
    }

    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    pub async fn closed(&self) {
        self.closed.cancelled().await
    }
}

pub struct RelayRoom {
    name: RoomName,
    state: Arc<RoomState>,
    outgoing: mpsc::Sender<ClientSignal>,
    left: AtomicBool,
}

impl RelayRoom {
    pub fn state(&self) -> &Arc<RoomState> {
        &self.state
    }
}

#[async_trait]
impl Room for RelayRoom {
    fn name(&self) -> &RoomName {
        &self.name
    }

    async fn wait_for_participant(&self, identity: &ParticipantIdentity) -> Result<RemoteParticipant> {
        self.state.wait_for_participant(identity).await
    }

    fn subscribe_audio(&self) -> broadcast::Receiver<InboundAudio> {
        self.state.subscribe_audio()
    }

    async fn publish_audio(&self, frame: AudioFrame) -> Result<()> {
        if self.state.is_closed() {
            return Err(DomainError::InvalidOperation("room is closed".to_string()));
        }
        self.outgoing
            .send(ClientSignal::Audio {
                data: frame.to_base64(),
                sample_rate: frame.sample_rate,
            })
            .await
            .map_err(|_| DomainError::InvalidOperation("room connection is gone".to_string()))
    }

    async fn closed(&self) {
        self.state.closed().await
    }

    async fn disconnect(&self) {
        if self.left.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(room = %self.name, "leaving room");
        // The writer may already be gone if the relay hung up
        let _ = self.outgoing.send(ClientSignal::Leave).await;
        self.state.close();
    }
}

/// Opens rooms through the relay endpoint
pub struct RelayConnector {
    relay_url: String,
    api_key: String,
    api_secret: String,
    identity: String,
}

impl RelayConnector {
    pub fn new(config: &LiveKitConfig) -> Self {
        Self {
            relay_url: config.relay_url.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            identity: AGENT_IDENTITY.to_string(),
        }
    }

    fn join_url(&self, room: &RoomName) -> Result<String> {
        let token = AccessToken::new(&self.api_key, &self.api_secret)
            .with_identity(&self.identity)
            .with_video_grant(VideoGrant::room_join(room.as_str()))
            .to_jwt()?;
        Ok(format!("{}?access_token={}", self.relay_url, token))
    }
}

#[async_trait]
impl RoomConnector for RelayConnector {
    async fn connect(&self, room: &RoomName, subscribe: AutoSubscribe) -> Result<Arc<dyn Room>> {
        let url = self.join_url(room)?;
        let (socket, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| DomainError::Platform(format!("room relay connect failed: {}", e)))?;
        info!(room = %room, "connected to room relay");

        let (mut sink, mut stream) = socket.split();
        let state = Arc::new(RoomState::new());
        let (outgoing, mut outgoing_rx) = mpsc::channel::<ClientSignal>(OUTGOING_BUFFER);

        let reader_state = state.clone();
        tokio::spawn(async move {
            while let Some(message) = stream.next().await {
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerSignal>(&text) {
                        Ok(signal) => reader_state.apply(signal),
                        Err(e) => debug!("ignoring relay message: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("room relay read failed: {}", e);
                        break;
                    }
                }
            }
            reader_state.close();
        });

        let writer_state = state.clone();
        tokio::spawn(async move {
            loop {
                let signal = tokio::select! {
                    biased;
                    signal = outgoing_rx.recv() => signal,
                    _ = writer_state.closed() => None,
                };
                let Some(signal) = signal else { break };
                let leaving = signal == ClientSignal::Leave;

                let text = match serde_json::to_string(&signal) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("failed to encode relay signal: {}", e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    warn!("room relay write failed: {}", e);
                    break;
                }
                if leaving {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let room = RelayRoom {
            name: room.clone(),
            state,
            outgoing,
            left: AtomicBool::new(false),
        };
        room.outgoing
            .send(ClientSignal::Subscribe {
                auto_subscribe: subscribe,
            })
            .await
            .map_err(|_| DomainError::Platform("room relay closed during setup".to_string()))?;

        Ok(Arc::new(room))
    }
}

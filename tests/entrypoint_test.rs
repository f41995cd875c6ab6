//! End-to-end call flow: dial, answer detection, agent hand-off and teardown

use async_trait::async_trait;
use outbound_caller::application::{entrypoint, AgentDispatcher, CallerServices, Job, JobContext};
use outbound_caller::config::{AgentConfig, CallerConfig};
use outbound_caller::domain::agent::{AgentContext, AgentHandle, AgentRuntime, AgentSpec, RunnerKind};
use outbound_caller::domain::call::{CallOutcome, CallStatus, DisconnectReason, RemoteParticipant};
use outbound_caller::domain::platform::{CallPlatform, SipDialRequest, SipParticipantInfo};
use outbound_caller::domain::room::{AudioFrame, AutoSubscribe, InboundAudio, Room, RoomConnector};
use outbound_caller::domain::shared::value_objects::{ParticipantIdentity, RoomName, SipTrunkId};
use outbound_caller::infrastructure::room::{RoomState, ServerSignal};
use outbound_caller::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_test::{assert_err, assert_ok};

const CALLEE: &str = "phone_user";

/// Room driven directly through relay signals
struct SignalRoom {
    name: RoomName,
    state: Arc<RoomState>,
    disconnects: AtomicUsize,
}

#[async_trait]
impl Room for SignalRoom {
    fn name(&self) -> &RoomName {
        &self.name
    }

    async fn wait_for_participant(&self, identity: &ParticipantIdentity) -> Result<RemoteParticipant> {
        self.state.wait_for_participant(identity).await
    }

    fn subscribe_audio(&self) -> broadcast::Receiver<InboundAudio> {
        self.state.subscribe_audio()
    }

    async fn publish_audio(&self, _frame: AudioFrame) -> Result<()> {
        Ok(())
    }

    async fn closed(&self) {
        self.state.closed().await
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.state.close();
    }
}

struct Connector {
    room: Arc<SignalRoom>,
    subscriptions: Mutex<Vec<AutoSubscribe>>,
}

#[async_trait]
impl RoomConnector for Connector {
    async fn connect(&self, _room: &RoomName, subscribe: AutoSubscribe) -> Result<Arc<dyn Room>> {
        self.subscriptions.lock().unwrap().push(subscribe);
        Ok(self.room.clone())
    }
}

/// Telephony stand-in that plays a scripted callee once dialed
struct ScriptedPlatform {
    state: Arc<RoomState>,
    script: Mutex<Option<Vec<(Duration, ServerSignal)>>>,
    dials: Mutex<Vec<SipDialRequest>>,
    removals: Mutex<Vec<String>>,
}

#[async_trait]
impl CallPlatform for ScriptedPlatform {
    async fn create_sip_participant(&self, request: &SipDialRequest) -> Result<SipParticipantInfo> {
        self.dials.lock().unwrap().push(request.clone());
        if let Some(script) = self.script.lock().unwrap().take() {
            let state = self.state.clone();
            tokio::spawn(async move {
                for (delay, signal) in script {
                    tokio::time::sleep(delay).await;
                    state.apply(signal);
                }
            });
        }
        Ok(SipParticipantInfo {
            participant_identity: request.participant_identity.to_string(),
            room_name: request.room_name.to_string(),
            ..Default::default()
        })
    }

    async fn remove_participant(&self, _room: &RoomName, identity: &ParticipantIdentity) -> Result<()> {
        self.removals.lock().unwrap().push(identity.to_string());
        self.state.apply(ServerSignal::ParticipantLeft {
            identity: identity.to_string(),
            disconnect_reason: Some(DisconnectReason::ParticipantRemoved),
        });
        Ok(())
    }
}

/// Agent that says goodbye through the end_call tool once the callee is live
struct HangUpRuntime {
    hang_up: bool,
    started: AtomicUsize,
}

impl AgentRuntime for HangUpRuntime {
    fn start(&self, spec: AgentSpec, ctx: AgentContext) -> Result<AgentHandle> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let hang_up = self.hang_up;
        let task = tokio::spawn(async move {
            if hang_up {
                loop {
                    if ctx.participant.call_status() == Some(CallStatus::Active) {
                        break;
                    }
                    tokio::select! {
                        _ = ctx.control.cancelled() => return,
                        _ = tokio::time::sleep(Duration::from_millis(50)) => {}
                    }
                }
                // Some conversation before saying goodbye
                tokio::time::sleep(Duration::from_secs(1)).await;
                let reply = ctx.tools.invoke("end_call", "{}").await.unwrap();
                assert_eq!(reply, "The call has been ended.");
            }
            ctx.control.cancelled().await;
        });
        Ok(AgentHandle::new(spec.kind(), task))
    }
}

struct Harness {
    room: Arc<SignalRoom>,
    connector: Arc<Connector>,
    platform: Arc<ScriptedPlatform>,
    runtime: Arc<HangUpRuntime>,
    services: Arc<CallerServices>,
}

fn status(value: &str) -> HashMap<String, String> {
    HashMap::from([("sip.callStatus".to_string(), value.to_string())])
}

fn harness(script: Vec<(Duration, ServerSignal)>, hang_up: bool) -> Harness {
    let state = Arc::new(RoomState::new());
    let room = Arc::new(SignalRoom {
        name: RoomName::parse("outbound-call-1").unwrap(),
        state: state.clone(),
        disconnects: AtomicUsize::new(0),
    });
    let connector = Arc::new(Connector {
        room: room.clone(),
        subscriptions: Mutex::new(Vec::new()),
    });
    let platform = Arc::new(ScriptedPlatform {
        state,
        script: Mutex::new(Some(script)),
        dials: Mutex::new(Vec::new()),
        removals: Mutex::new(Vec::new()),
    });
    let runtime = Arc::new(HangUpRuntime {
        hang_up,
        started: AtomicUsize::new(0),
    });

    let agent = AgentConfig {
        runner: RunnerKind::Realtime,
        openai_api_key: "sk-test".to_string(),
        deepgram_api_key: None,
        realtime_model: "gpt-4o-realtime-preview".to_string(),
        realtime_voice: "alloy".to_string(),
        llm_model: "gpt-4o".to_string(),
        stt_model: "nova-2-phonecall".to_string(),
        tts_model: "tts-1".to_string(),
        tts_voice: "alloy".to_string(),
    };
    let services = Arc::new(CallerServices {
        connector: connector.clone(),
        platform: platform.clone(),
        dispatcher: AgentDispatcher::new(runtime.clone(), agent),
        caller: CallerConfig {
            trunk_id: SipTrunkId::parse("ST_outbound").unwrap(),
            participant_identity: ParticipantIdentity::new(CALLEE),
            instructions: "You are a scheduling assistant.".to_string(),
            answer_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
        },
    });

    Harness {
        room,
        connector,
        platform,
        runtime,
        services,
    }
}

fn job(metadata: &str) -> Job {
    Job {
        id: "AJ_1".to_string(),
        room_name: RoomName::parse("outbound-call-1").unwrap(),
        metadata: metadata.to_string(),
    }
}

fn joined(call_status: &str) -> ServerSignal {
    ServerSignal::ParticipantJoined {
        identity: CALLEE.to_string(),
        attributes: status(call_status),
    }
}

fn updated(call_status: &str) -> ServerSignal {
    ServerSignal::ParticipantUpdated {
        identity: CALLEE.to_string(),
        attributes: status(call_status),
    }
}

#[tokio::test(start_paused = true)]
async fn test_answered_call_is_ended_by_agent() {
    let h = harness(
        vec![
            (Duration::ZERO, joined("dialing")),
            (Duration::from_millis(200), updated("ringing")),
            (Duration::from_millis(300), updated("active")),
        ],
        true,
    );

    let ctx = JobContext::new(job("+15105550100"), h.services.clone());
    let outcome = assert_ok!(entrypoint(ctx).await);
    assert_eq!(outcome, Some(CallOutcome::Attended));

    let dials = h.platform.dials.lock().unwrap().clone();
    assert_eq!(dials.len(), 1);
    assert_eq!(dials[0].phone_number, "+15105550100");
    assert_eq!(dials[0].trunk_id.as_str(), "ST_outbound");
    assert_eq!(dials[0].participant_identity.as_str(), CALLEE);

    assert_eq!(*h.platform.removals.lock().unwrap(), vec![CALLEE.to_string()]);
    assert_eq!(*h.connector.subscriptions.lock().unwrap(), vec![AutoSubscribe::AudioOnly]);
    assert_eq!(h.runtime.started.load(Ordering::SeqCst), 1);
    assert_eq!(h.room.disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_declined_call_tears_down_session() {
    let h = harness(
        vec![
            (Duration::ZERO, joined("ringing")),
            (
                Duration::from_millis(500),
                ServerSignal::ParticipantLeft {
                    identity: CALLEE.to_string(),
                    disconnect_reason: Some(DisconnectReason::UserRejected),
                },
            ),
        ],
        false,
    );

    let ctx = JobContext::new(job("+15105550100"), h.services.clone());
    let outcome = assert_ok!(entrypoint(ctx).await);
    assert_eq!(outcome, Some(CallOutcome::Rejected));
    assert!(h.platform.removals.lock().unwrap().is_empty());
    assert_eq!(h.room.disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_call_times_out() {
    let h = harness(vec![(Duration::ZERO, joined("ringing"))], false);

    let started = tokio::time::Instant::now();
    let ctx = JobContext::new(job("+15105550100"), h.services.clone());
    let outcome = assert_ok!(entrypoint(ctx).await);
    assert_eq!(outcome, Some(CallOutcome::TimedOut));
    assert!(started.elapsed() >= Duration::from_secs(30));
    assert_eq!(h.room.disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_answering_machine_is_not_a_human() {
    let h = harness(
        vec![
            (Duration::ZERO, joined("ringing")),
            (Duration::from_millis(400), updated("automation")),
        ],
        false,
    );

    let ctx = JobContext::new(job("+15105550100"), h.services.clone());
    let outcome = assert_ok!(entrypoint(ctx).await);
    assert_eq!(outcome, Some(CallOutcome::TimedOut));
}

#[tokio::test(start_paused = true)]
async fn test_room_closed_before_callee_joins() {
    let h = harness(vec![(Duration::from_millis(100), ServerSignal::RoomClosed)], false);

    let ctx = JobContext::new(job("+15105550100"), h.services.clone());
    assert_err!(entrypoint(ctx).await);
    assert_eq!(h.runtime.started.load(Ordering::SeqCst), 0);
    assert_eq!(h.room.disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_phone_number_never_dials() {
    let h = harness(Vec::new(), false);

    let ctx = JobContext::new(job("  "), h.services.clone());
    assert_err!(entrypoint(ctx).await);
    assert!(h.platform.dials.lock().unwrap().is_empty());
    assert_eq!(h.room.disconnects.load(Ordering::SeqCst), 1);
}

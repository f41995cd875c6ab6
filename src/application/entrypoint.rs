//! Job entrypoint - one outbound call from room connection to teardown

use crate::application::call_actions::EndCallTool;
use crate::application::dialer::Dialer;
use crate::application::dispatcher::AgentDispatcher;
use crate::application::monitor::CallOutcomeMonitor;
use crate::config::CallerConfig;
use crate::domain::agent::{AgentContext, ToolRegistry};
use crate::domain::call::{CallOutcome, CallSession, CallSessionControl, ShutdownReason};
use crate::domain::platform::CallPlatform;
use crate::domain::room::{AutoSubscribe, Room, RoomConnector};
use crate::domain::shared::error::Result;
use crate::domain::shared::value_objects::RoomName;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// How long a runner gets to stop after the session ends
const AGENT_STOP_GRACE: Duration = Duration::from_secs(5);

/// Work item handed to this worker by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub room_name: RoomName,
    /// Destination phone number
    pub metadata: String,
}

/// Long-lived collaborators shared by every job of a worker
pub struct CallerServices {
    pub connector: Arc<dyn RoomConnector>,
    pub platform: Arc<dyn CallPlatform>,
    pub dispatcher: AgentDispatcher,
    pub caller: CallerConfig,
}

pub struct JobContext {
    pub job: Job,
    pub services: Arc<CallerServices>,
}

impl JobContext {
    pub fn new(job: Job, services: Arc<CallerServices>) -> Self {
        Self { job, services }
    }
}

/// Run one job.
///
/// Returns the monitor's decision, or `None` when the session ended before
/// one was reached. The room is always left on return.
pub async fn entrypoint(ctx: JobContext) -> Result<Option<CallOutcome>> {
    info!("Connecting to Room: {}", ctx.job.room_name);
    let room = ctx
        .services
        .connector
        .connect(&ctx.job.room_name, AutoSubscribe::AudioOnly)
        .await?;

    let result = run_call(&ctx, room.clone()).await;
    room.disconnect().await;
    result
}

async fn run_call(ctx: &JobContext, room: Arc<dyn Room>) -> Result<Option<CallOutcome>> {
    let services = &ctx.services;
    let caller = &services.caller;

    let session = CallSession::new(
        room.name().clone(),
        &ctx.job.metadata,
        caller.participant_identity.clone(),
        caller.instructions.clone(),
    )?;
    debug!(session = %session.id(), job = %ctx.job.id, "call session created");

    let dialer = Dialer::new(services.platform.clone(), caller.trunk_id.clone());
    let participant = dialer.dial(room.as_ref(), &session).await?;

    let control = Arc::new(CallSessionControl::new());
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(EndCallTool::new(
        services.platform.clone(),
        session.room_name().clone(),
        session.participant_identity().clone(),
        control.clone(),
    )))?;

    let agent = services.dispatcher.dispatch(
        AgentContext {
            room: room.clone(),
            participant: participant.clone(),
            tools,
            control: control.clone(),
        },
        session.instructions(),
    )?;

    let monitor = CallOutcomeMonitor::new(caller.answer_timeout, caller.poll_interval);
    let monitoring = monitor.run(&participant);
    tokio::pin!(monitoring);

    // Only a hangup through the tool pre-empts the decision; any other
    // shutdown still lets the monitor finish its window
    let decision = tokio::select! {
        outcome = &mut monitoring => Some(outcome),
        _ = control.cancelled() => None,
        _ = room.closed() => {
            control.shutdown(ShutdownReason::RoomClosed);
            None
        }
    };
    let decision = match decision {
        Some(outcome) => Some(outcome),
        None if control.reason() == Some(ShutdownReason::EndCall) => None,
        None => {
            debug!(reason = ?control.reason(), "session ended before a decision, still monitoring");
            Some(monitoring.await)
        }
    };

    match decision {
        Some(CallOutcome::Attended) => {
            // The conversation goes on until someone ends it
            tokio::select! {
                _ = control.cancelled() => {}
                _ = room.closed() => {
                    control.shutdown(ShutdownReason::RoomClosed);
                }
                _ = participant.disconnected() => {
                    info!(identity = %participant.identity(), "callee hung up");
                    control.shutdown(ShutdownReason::CalleeLeft);
                }
            }
        }
        Some(outcome) => {
            info!("Session Timeout");
            control.shutdown(ShutdownReason::Outcome(outcome));
        }
        None => {}
    }

    info!(
        room = %session.room_name(),
        reason = ?control.reason(),
        "call session ended"
    );
    agent.stop(AGENT_STOP_GRACE).await;

    Ok(decision)
}

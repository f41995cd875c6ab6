//! Agent runtime port - starts a runner against a room and a participant

use crate::domain::agent::spec::{AgentSpec, RunnerKind};
use crate::domain::agent::tool::ToolRegistry;
use crate::domain::call::{CallSessionControl, RemoteParticipant};
use crate::domain::room::Room;
use crate::domain::shared::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Everything a runner needs for one call
#[derive(Clone)]
pub struct AgentContext {
    pub room: Arc<dyn Room>,
    pub participant: RemoteParticipant,
    pub tools: ToolRegistry,
    pub control: Arc<CallSessionControl>,
}

/// Running agent session
#[derive(Debug)]
pub struct AgentHandle {
    kind: RunnerKind,
    task: JoinHandle<()>,
}

impl AgentHandle {
    pub fn new(kind: RunnerKind, task: JoinHandle<()>) -> Self {
        Self { kind, task }
    }

    pub fn kind(&self) -> RunnerKind {
        self.kind
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn abort(&self) {
        self.task.abort();
    }

    /// Wait for the runner to stop
    pub async fn join(self) {
        // A cancelled or panicked runner has stopped all the same
        let _ = self.task.await;
    }

    /// Give the runner `grace` to wind down after cancellation, then abort it
    pub async fn stop(mut self, grace: Duration) {
        if tokio::time::timeout(grace, &mut self.task).await.is_err() {
            self.task.abort();
            let _ = self.task.await;
        }
    }
}

/// Starts agent runners. Starting never blocks on the conversation itself.
pub trait AgentRuntime: Send + Sync {
    fn start(&self, spec: AgentSpec, ctx: AgentContext) -> Result<AgentHandle>;
}

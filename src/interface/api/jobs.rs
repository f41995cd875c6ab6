//! Job intake and health endpoints
//!
//! Jobs are pushed over HTTP by the dispatcher that fronts this worker; the
//! platform's own agent-worker registration protocol is not spoken here.

use crate::application::entrypoint::{entrypoint, CallerServices, Job, JobContext};
use crate::domain::shared::value_objects::RoomName;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Starts accepted jobs
pub trait JobLauncher: Send + Sync {
    fn launch(&self, job: Job);
}

/// Runs each job's entrypoint on its own task
pub struct EntrypointLauncher {
    services: Arc<CallerServices>,
}

impl EntrypointLauncher {
    pub fn new(services: Arc<CallerServices>) -> Self {
        Self { services }
    }
}

impl JobLauncher for EntrypointLauncher {
    fn launch(&self, job: Job) {
        let ctx = JobContext::new(job, self.services.clone());
        tokio::spawn(async move {
            let job_id = ctx.job.id.clone();
            match entrypoint(ctx).await {
                Ok(outcome) => info!(job = %job_id, outcome = ?outcome, "job finished"),
                Err(e) => error!(job = %job_id, "job failed: {}", e),
            }
        });
    }
}

#[derive(Clone)]
pub struct WorkerState {
    pub agent_name: String,
    pub launcher: Arc<dyn JobLauncher>,
}

#[derive(Debug, Deserialize)]
pub struct JobRequest {
    pub room_name: String,
    /// Destination phone number
    #[serde(default)]
    pub metadata: String,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobAccepted {
    pub job_id: String,
    pub room_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthBody {
    pub status: String,
    pub agent_name: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn reject(status: StatusCode, message: String) -> ApiError {
    warn!("job rejected: {}", message);
    (status, Json(ErrorBody { error: message }))
}

/// Accept a job for this worker's agent and start it in the background
pub async fn create_job(
    State(state): State<WorkerState>,
    Json(request): Json<JobRequest>,
) -> Result<(StatusCode, Json<JobAccepted>), ApiError> {
    if let Some(agent_name) = request.agent_name.as_deref() {
        if agent_name != state.agent_name {
            return Err(reject(
                StatusCode::NOT_FOUND,
                format!("no agent named '{}' on this worker", agent_name),
            ));
        }
    }

    let room_name = RoomName::parse(&request.room_name)
        .map_err(|e| reject(StatusCode::BAD_REQUEST, e.to_string()))?;
    let job_id = request
        .job_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    info!(job = %job_id, room = %room_name, "job received");
    metrics::counter!("jobs_received_total").increment(1);

    state.launcher.launch(Job {
        id: job_id.clone(),
        room_name: room_name.clone(),
        metadata: request.metadata,
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(JobAccepted {
            job_id,
            room_name: room_name.to_string(),
        }),
    ))
}

pub async fn health_check(State(state): State<WorkerState>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok".to_string(),
        agent_name: state.agent_name,
    })
}

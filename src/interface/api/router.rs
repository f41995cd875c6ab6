//! API Router configuration

use super::jobs::{create_job, health_check, WorkerState};
use super::metrics_handler::metrics_handler;
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

/// Build the worker router
pub fn build_router(state: WorkerState, prometheus_handle: PrometheusHandle) -> Router {
    let worker_routes = Router::new()
        .route("/health", get(health_check))
        .route("/jobs", post(create_job))
        .with_state(state);

    // Metrics route (separate state)
    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(prometheus_handle);

    Router::new()
        .merge(worker_routes)
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
}

//! Prometheus metrics handler

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::describe_counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and describe the worker's counters
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!("jobs_received_total", "Jobs accepted by the worker");
    describe_counter!("outbound_calls_total", "SIP calls originated");
    describe_counter!(
        "outbound_call_outcomes_total",
        "Call outcomes decided by the monitor, by outcome"
    );
    describe_counter!(
        "end_call_invocations_total",
        "end_call tool invocations, by result"
    );

    Ok(handle)
}

/// HTTP metrics handler
pub async fn metrics_handler(State(prometheus_handle): State<PrometheusHandle>) -> Response {
    (StatusCode::OK, prometheus_handle.render()).into_response()
}

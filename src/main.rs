use outbound_caller::application::{AgentDispatcher, CallerServices};
use outbound_caller::config::Config;
use outbound_caller::infrastructure::agents::PluginAgentRuntime;
use outbound_caller::infrastructure::livekit::LiveKitClient;
use outbound_caller::infrastructure::room::RelayConnector;
use outbound_caller::interface::api::{build_router, init_metrics, EntrypointLauncher, WorkerState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("outbound_caller=info,tower_http=info")),
        )
        .init();

    info!("Starting Outbound Caller worker");

    // Load configuration; a missing trunk id stops the worker here
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };
    info!(
        agent = %config.worker.agent_name,
        runner = %config.agent.runner,
        trunk = %config.caller.trunk_id,
        "Configuration loaded"
    );

    let platform = Arc::new(LiveKitClient::from_config(&config.livekit));
    let connector = Arc::new(RelayConnector::new(&config.livekit));
    let runtime = Arc::new(PluginAgentRuntime::new(config.agent.clone()));

    let services = Arc::new(CallerServices {
        connector,
        platform,
        dispatcher: AgentDispatcher::new(runtime, config.agent.clone()),
        caller: config.caller.clone(),
    });

    // Initialize metrics
    let prometheus_handle = init_metrics()?;
    info!("Metrics initialized");

    let state = WorkerState {
        agent_name: config.worker.agent_name.clone(),
        launcher: Arc::new(EntrypointLauncher::new(services)),
    };
    let app = build_router(state, prometheus_handle);

    let addr: SocketAddr = format!("{}:{}", config.worker.host, config.worker.port).parse()?;
    info!("Worker listening on http://{}", addr);
    info!("  POST /jobs     - accept a call job");
    info!("  GET  /health   - health check");
    info!("  GET  /metrics  - Prometheus metrics");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Outbound Caller worker stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

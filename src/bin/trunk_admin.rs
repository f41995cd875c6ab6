//! Interactive administration of outbound SIP trunks

use outbound_caller::application::trunk_admin::{run_cli, AdminError, TerminalPrompter};
use outbound_caller::config::{LiveKitConfig, Settings, TrunkDefaults};
use outbound_caller::domain::sip_trunk::SipTrunkRepository;
use outbound_caller::infrastructure::livekit::LiveKitClient;
use std::io::Write;
use tracing_subscriber::EnvFilter;

fn connect() -> Result<(Box<dyn SipTrunkRepository>, TrunkDefaults), AdminError> {
    let settings = Settings::from_env()?;
    let livekit = LiveKitConfig::from_settings(&settings)?;
    let client: Box<dyn SipTrunkRepository> = Box::new(LiveKitClient::from_config(&livekit));
    Ok((client, TrunkDefaults::from_settings(&settings)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut stdout = std::io::stdout();
    run_cli(&args, connect, &mut TerminalPrompter, &mut stdout).await?;
    stdout.flush()?;
    Ok(())
}

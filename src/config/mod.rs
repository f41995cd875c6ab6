//! Configuration management
//!
//! Settings come from the process environment (optionally seeded from
//! `.env.local` / `.env`) and are validated once at startup into the typed
//! objects below, which are then passed down explicitly.

use crate::domain::agent::RunnerKind;
use crate::domain::shared::value_objects::{ParticipantIdentity, SipTrunkId};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

const TRUNK_ID_HELP: &str = "SIP_OUTBOUND_TRUNK_ID is not set. Please follow the guide at \
     https://docs.livekit.io/agents/quickstarts/outbound-calls/ to set it up.";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{TRUNK_ID_HELP}")]
    InvalidTrunkId,

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

/// Raw settings as read from the environment; every key is optional here
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    pub livekit_url: Option<String>,
    pub livekit_api_key: Option<String>,
    pub livekit_api_secret: Option<String>,
    pub room_relay_url: Option<String>,

    pub sip_outbound_trunk_id: Option<String>,
    pub agent_instructions: Option<String>,
    pub call_answer_timeout_ms: Option<String>,
    pub call_poll_interval_ms: Option<String>,

    pub agent_name: Option<String>,
    pub agent_runner: Option<String>,
    pub openai_api_key: Option<String>,
    pub deepgram_api_key: Option<String>,
    pub openai_realtime_model: Option<String>,
    pub openai_realtime_voice: Option<String>,
    pub openai_llm_model: Option<String>,
    pub openai_tts_model: Option<String>,
    pub openai_tts_voice: Option<String>,
    pub deepgram_stt_model: Option<String>,

    pub worker_host: Option<String>,
    pub worker_port: Option<String>,

    pub twilio_sip_termination_endpoint: Option<String>,
    pub twilio_outbound_caller_number: Option<String>,
    pub twilio_sip_auth_username: Option<String>,
    pub twilio_sip_auth_password: Option<String>,
}

impl Settings {
    /// Load `.env.local` / `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::from_filename(".env.local").ok();
        dotenvy::dotenv().ok();
        Self::build(config::Environment::default())
    }

    /// Read settings from an explicit map of environment-style keys
    pub fn from_map(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let source: config::Map<String, String> = vars.into_iter().collect();
        Self::build(config::Environment::default().source(Some(source)))
    }

    fn build(environment: config::Environment) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

/// Access to the media platform's administrative API
#[derive(Debug, Clone)]
pub struct LiveKitConfig {
    pub url: String,
    pub api_key: String,
    pub api_secret: String,
    /// WebSocket endpoint of the room media bridge, `{url}/relay` when the
    /// bridge is served behind the platform host
    pub relay_url: String,
}

impl LiveKitConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let url = required(&settings.livekit_url, "LIVEKIT_URL")?;
        let relay_url = non_empty(&settings.room_relay_url)
            .unwrap_or_else(|| format!("{}/relay", to_ws_url(url.trim_end_matches('/'))));

        Ok(Self {
            api_key: required(&settings.livekit_api_key, "LIVEKIT_API_KEY")?,
            api_secret: required(&settings.livekit_api_secret, "LIVEKIT_API_SECRET")?,
            url,
            relay_url,
        })
    }
}

/// Parameters of each outbound call
#[derive(Debug, Clone)]
pub struct CallerConfig {
    pub trunk_id: SipTrunkId,
    pub participant_identity: ParticipantIdentity,
    /// Default instructions every call starts from
    pub instructions: String,
    pub answer_timeout: Duration,
    pub poll_interval: Duration,
}

impl CallerConfig {
    pub const DEFAULT_IDENTITY: &'static str = "phone_user";

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let trunk_id = non_empty(&settings.sip_outbound_trunk_id)
            .ok_or(ConfigError::InvalidTrunkId)
            .and_then(|id| SipTrunkId::parse(&id).map_err(|_| ConfigError::InvalidTrunkId))?;

        Ok(Self {
            trunk_id,
            participant_identity: ParticipantIdentity::new(Self::DEFAULT_IDENTITY),
            instructions: settings.agent_instructions.clone().unwrap_or_default(),
            answer_timeout: millis(
                &settings.call_answer_timeout_ms,
                "CALL_ANSWER_TIMEOUT_MS",
                Duration::from_secs(30),
            )?,
            poll_interval: millis(
                &settings.call_poll_interval_ms,
                "CALL_POLL_INTERVAL_MS",
                Duration::from_millis(100),
            )?,
        })
    }
}

/// Agent runner selection and plugin credentials
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub runner: RunnerKind,
    pub openai_api_key: String,
    pub deepgram_api_key: Option<String>,
    pub realtime_model: String,
    pub realtime_voice: String,
    pub llm_model: String,
    pub stt_model: String,
    pub tts_model: String,
    pub tts_voice: String,
}

impl AgentConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let runner = match non_empty(&settings.agent_runner) {
            Some(value) => value.parse().map_err(|e| ConfigError::Invalid {
                key: "AGENT_RUNNER",
                reason: format!("{}", e),
            })?,
            None => RunnerKind::default(),
        };

        let deepgram_api_key = non_empty(&settings.deepgram_api_key);
        if runner == RunnerKind::Pipeline && deepgram_api_key.is_none() {
            return Err(ConfigError::Missing("DEEPGRAM_API_KEY"));
        }

        Ok(Self {
            runner,
            openai_api_key: required(&settings.openai_api_key, "OPENAI_API_KEY")?,
            deepgram_api_key,
            realtime_model: non_empty(&settings.openai_realtime_model)
                .unwrap_or_else(|| "gpt-4o-realtime-preview".to_string()),
            realtime_voice: non_empty(&settings.openai_realtime_voice)
                .unwrap_or_else(|| "alloy".to_string()),
            llm_model: non_empty(&settings.openai_llm_model).unwrap_or_else(|| "gpt-4o".to_string()),
            stt_model: non_empty(&settings.deepgram_stt_model)
                .unwrap_or_else(|| "nova-2-phonecall".to_string()),
            tts_model: non_empty(&settings.openai_tts_model).unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: non_empty(&settings.openai_tts_voice).unwrap_or_else(|| "alloy".to_string()),
        })
    }
}

/// Worker process settings
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name the worker accepts jobs for
    pub agent_name: String,
    pub host: String,
    pub port: u16,
}

impl WorkerConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let port = match non_empty(&settings.worker_port) {
            Some(port) => port.parse().map_err(|e| ConfigError::Invalid {
                key: "WORKER_PORT",
                reason: format!("{}", e),
            })?,
            None => 8081,
        };

        Ok(Self {
            agent_name: non_empty(&settings.agent_name)
                .unwrap_or_else(|| "outbound-caller".to_string()),
            host: non_empty(&settings.worker_host).unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
        })
    }
}

/// Complete worker configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub livekit: LiveKitConfig,
    pub caller: CallerConfig,
    pub agent: AgentConfig,
    pub worker: WorkerConfig,
}

impl Config {
    /// Load and validate everything the worker needs; fails fast on a bad trunk id
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_settings(&Settings::from_env()?)
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            caller: CallerConfig::from_settings(settings)?,
            livekit: LiveKitConfig::from_settings(settings)?,
            agent: AgentConfig::from_settings(settings)?,
            worker: WorkerConfig::from_settings(settings)?,
        })
    }
}

/// Prompt defaults for the trunk admin tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrunkDefaults {
    pub name: String,
    pub address: String,
    pub numbers: String,
    pub auth_username: String,
    pub auth_password: String,
}

impl TrunkDefaults {
    pub const DEFAULT_NAME: &'static str = "Twilio SIP Trunk";

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            address: settings.twilio_sip_termination_endpoint.clone().unwrap_or_default(),
            numbers: settings.twilio_outbound_caller_number.clone().unwrap_or_default(),
            auth_username: settings.twilio_sip_auth_username.clone().unwrap_or_default(),
            auth_password: settings.twilio_sip_auth_password.clone().unwrap_or_default(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required(value: &Option<String>, key: &'static str) -> Result<String, ConfigError> {
    non_empty(value).ok_or(ConfigError::Missing(key))
}

fn millis(value: &Option<String>, key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match non_empty(value) {
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| ConfigError::Invalid {
                key,
                reason: format!("{}", e),
            }),
        None => Ok(default),
    }
}

/// Map an `http(s)://` URL to its `ws(s)://` form
pub fn to_ws_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        url.to_string()
    }
}

/// Map a `ws(s)://` URL to its `http(s)://` form
pub fn to_http_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("wss://") {
        format!("https://{}", rest)
    } else if let Some(rest) = url.strip_prefix("ws://") {
        format!("http://{}", rest)
    } else {
        url.to_string()
    }
}

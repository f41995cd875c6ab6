//! Agent runner strategies and their settings

use crate::domain::agent::chat::ChatContext;
use crate::domain::agent::speech::VadOptions;
use crate::domain::shared::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which runner drives the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerKind {
    /// VAD, speech-to-text, LLM and text-to-speech in turns
    Pipeline,
    /// One speech-in/speech-out realtime model
    #[default]
    Realtime,
}

impl RunnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunnerKind::Pipeline => "pipeline",
            RunnerKind::Realtime => "realtime",
        }
    }
}

impl FromStr for RunnerKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pipeline" => Ok(RunnerKind::Pipeline),
            "realtime" | "multimodal" => Ok(RunnerKind::Realtime),
            other => Err(DomainError::ValidationError(format!(
                "unknown agent runner '{}', expected 'pipeline' or 'realtime'",
                other
            ))),
        }
    }
}

impl fmt::Display for RunnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Audio,
    Text,
}

/// Turn-based pipeline settings
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSpec {
    pub vad: VadOptions,
    pub stt_model: String,
    pub llm_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    /// Seeded with the system instructions
    pub chat_context: ChatContext,
}

/// Realtime multimodal model settings
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeSpec {
    pub model: String,
    pub instructions: String,
    pub modalities: Vec<Modality>,
    pub voice: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentSpec {
    Pipeline(PipelineSpec),
    Realtime(RealtimeSpec),
}

impl AgentSpec {
    pub fn kind(&self) -> RunnerKind {
        match self {
            AgentSpec::Pipeline(_) => RunnerKind::Pipeline,
            AgentSpec::Realtime(_) => RunnerKind::Realtime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_kind_parse() {
        assert_eq!("pipeline".parse::<RunnerKind>().unwrap(), RunnerKind::Pipeline);
        assert_eq!(" Realtime ".parse::<RunnerKind>().unwrap(), RunnerKind::Realtime);
        assert_eq!("multimodal".parse::<RunnerKind>().unwrap(), RunnerKind::Realtime);
        assert!("batch".parse::<RunnerKind>().is_err());
        assert_eq!(RunnerKind::default(), RunnerKind::Realtime);
    }
}

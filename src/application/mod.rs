//! Application layer - Use cases and application services
//!
//! This layer orchestrates domain objects to fulfill use cases:
//! - Placing an outbound call and waiting for the callee
//! - Deciding whether a human answered
//! - Handing the call to a voice agent
//! - Managing outbound SIP trunks

pub mod call_actions;
pub mod dialer;
pub mod dispatcher;
pub mod entrypoint;
pub mod monitor;
pub mod trunk_admin;

#[cfg(test)]
pub(crate) mod test_support;

pub use call_actions::EndCallTool;
pub use dialer::Dialer;
pub use dispatcher::AgentDispatcher;
pub use entrypoint::{entrypoint, CallerServices, Job, JobContext};
pub use monitor::CallOutcomeMonitor;
pub use trunk_admin::{AdminError, AdminTask, Prompter, TrunkAdmin};

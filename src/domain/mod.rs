//! Domain layer - Core business logic and rules
//!
//! This layer contains:
//! - Entities and value objects for a call session
//! - The agent model: runner strategies, tools, conversation history
//! - Ports for the media platform, the room connection and the agent runtime

pub mod agent;
pub mod call;
pub mod platform;
pub mod room;
pub mod shared;
pub mod sip_trunk;

// Re-export commonly used types
pub use shared::{DomainError, Result};

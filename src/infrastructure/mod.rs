//! Infrastructure layer - Adapters for the platform and the speech/model providers
//!
//! This layer implements the ports defined in the domain layer.

pub mod agents;
pub mod livekit;
pub mod plugins;
pub mod room;

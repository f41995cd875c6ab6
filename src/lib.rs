//! Outbound Caller - An AI voice agent that phones people
//!
//! Built in Domain-Driven Design (DDD) layers: each job dials a phone number
//! into a media room over a SIP trunk, waits for a human to pick up and then
//! hands the conversation to a voice agent.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::{DomainError, Result};

//! Interface layer - External interfaces
//!
//! This layer handles:
//! - Job intake from the platform
//! - Health and metrics endpoints
//! - Request/response formatting

pub mod api;

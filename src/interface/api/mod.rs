//! API interface implementations

pub mod jobs;
pub mod metrics_handler;
pub mod router;

pub use jobs::{EntrypointLauncher, JobLauncher, WorkerState};
pub use metrics_handler::init_metrics;
pub use router::build_router;

//! Room connections through the WebSocket media bridge

pub mod relay;
pub mod signal;

pub use relay::{RelayConnector, RelayRoom, RoomState};
pub use signal::{ClientSignal, ServerSignal};

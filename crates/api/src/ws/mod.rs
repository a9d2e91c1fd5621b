//! WebSocket infrastructure for progress streaming.
//!
//! Provides the broadcast hub, heartbeat monitoring, and the HTTP
//! upgrade handler used by the router.

mod handler;
mod heartbeat;
pub mod hub;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use hub::ProgressHub;

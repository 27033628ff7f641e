//! WebSocket Gateway
//!
//! Real-time room presence and messaging over WebSocket connections.

pub mod events;
pub mod gateway;
pub mod handler;
pub mod session;

pub use events::{ClientEvent, ServerEvent};
pub use gateway::Gateway;
pub use handler::ws_handler;
pub use session::ConnectionState;

//! WebSocket relay: wire protocol, routing rules, connection handler

pub mod handler;
pub mod protocol;
pub mod routing;

pub use handler::ws_handler;
pub use protocol::{ActionPayload, ClientMsg, JoinPayload, ServerMsg};

//! Voyage WebSocket sessions
//!
//! One WebSocket per (voyage, role) seat:
//! - Admission through the shared hub, rejected seats closed with code 4000
//! - Recent voyage history replayed to the newcomer only
//! - Chat frames from the client rebroadcast to the whole voyage

mod connection;
mod handler;
mod protocol;


pub use connection::WsConnection;
pub use handler::handle_voyage_ws;

/// The hub as the server instantiates it.
pub type VoyageHub = voyage_hub::ConnectionHub<WsConnection>;

//! Hub error types and the rejection signal handed to transports.

use serde::Serialize;
use std::time::Duration;

use crate::registry::RoomId;

/// WebSocket close code used when a limited role is already taken.
pub const ROLE_OCCUPIED_CLOSE_CODE: u16 = 4000;

/// Status/reason pair a transport uses to close a rejected connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub code: u16,
    pub reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Another connection holds this limited role in this room.
    #[error("Connection Denied: The {role} role for {room} is already occupied.")]
    RoleOccupied { room: RoomId, role: String },

    /// The message could not be serialized; only the current broadcast is lost.
    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl HubError {
    /// The close signal for errors that end a connection before it enters a room.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            HubError::RoleOccupied { .. } => Some(Rejection {
                code: ROLE_OCCUPIED_CLOSE_CODE,
                reason: self.to_string(),
            }),
            HubError::Serialize(_) => None,
        }
    }
}

/// Per-recipient delivery failure. Never surfaces to broadcast callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("connection closed")]
    Closed,

    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),
}

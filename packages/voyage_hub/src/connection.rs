use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::SendError;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a connection.
///
/// Role occupancy and membership compare connections by this id, never by
/// role name, so a stale removal cannot evict a later occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A live bidirectional transport, as far as the hub cares.
///
/// The transport owns the connection (`Arc<C>`); the hub only keeps a weak
/// reference and calls [`Connection::send_text`] during broadcasts.
pub trait Connection: Send + Sync + 'static {
    fn id(&self) -> ConnectionId;

    /// Deliver one serialized frame. May suspend on transport I/O.
    fn send_text(&self, text: Arc<str>) -> impl Future<Output = Result<(), SendError>> + Send;

    /// Called after the hub dropped this connection from a room because a
    /// send failed or timed out. Its membership and roles are already gone;
    /// the transport should end the session.
    fn evict(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_display() {
        let id = ConnectionId(42);
        assert_eq!(id.to_string(), "conn-42");
    }
}

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::{Notify, mpsc};
use voyage_hub::{Connection, ConnectionId, SendError};

/// Hub-facing handle for one WebSocket.
///
/// Frames are queued on the session's outbound channel; the session's sender
/// task owns the socket sink and drains it. Once the session ends the channel
/// closes and sends fail with [`SendError::Closed`].
#[derive(Debug)]
pub struct WsConnection {
    id: ConnectionId,
    tx: mpsc::Sender<Message>,
    evicted: Notify,
}

impl WsConnection {
    pub fn new(tx: mpsc::Sender<Message>) -> Self {
        Self {
            id: ConnectionId::next(),
            tx,
            evicted: Notify::new(),
        }
    }

    /// Resolves once the hub has evicted this connection. An eviction that
    /// happened before the call is not lost.
    pub async fn evicted(&self) {
        self.evicted.notified().await
    }
}

impl Connection for WsConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send_text(&self, text: Arc<str>) -> Result<(), SendError> {
        self.tx
            .send(Message::Text(text.as_ref().into()))
            .await
            .map_err(|_| SendError::Closed)
    }

    fn evict(&self) {
        self.evicted.notify_one();
    }
}

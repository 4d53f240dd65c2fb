use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use tokio::sync::mpsc;

use crate::AppState;
use crate::config::{FileConfig, ServerConfig};
use crate::metrics::ServerMetrics;
use crate::ws::{VoyageHub, WsConnection};

/// Build an `AppState` with default config and a short hub send timeout.
pub fn test_app_state() -> AppState {
    let file_config = FileConfig::default();
    let mut hub_config = file_config.hub.to_hub_config();
    hub_config.send_timeout = Duration::from_millis(200);

    AppState {
        hub: Arc::new(VoyageHub::new(hub_config)),
        server_config: Arc::new(
            ServerConfig::from_file(&file_config).expect("default config is valid"),
        ),
        metrics: Arc::new(ServerMetrics::new()),
    }
}

/// A `WsConnection` with no socket behind it. Its receiver is dropped, so any
/// frame sent to it fails as closed.
pub fn detached_connection() -> Arc<WsConnection> {
    let (tx, _rx) = mpsc::channel::<Message>(1);
    Arc::new(WsConnection::new(tx))
}

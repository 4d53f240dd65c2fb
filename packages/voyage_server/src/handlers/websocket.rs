use axum::{
    extract::{Path, State, WebSocketUpgrade},
    response::Response,
};

use crate::AppState;
use crate::ws;

/// Upgrade to a voyage session. The upgrade is always accepted; seat
/// conflicts are reported in-band with a 4000 close frame.
pub async fn voyage_websocket_handler(
    State(state): State<AppState>,
    Path((voyage_id, role)): Path<(String, String)>,
    ws: WebSocketUpgrade,
) -> Response {
    let hub = state.hub.clone();
    let metrics = state.metrics.clone();
    let capacity = state.server_config.websocket.send_channel_capacity;

    ws.on_upgrade(move |socket| {
        ws::handle_voyage_ws(socket, hub, voyage_id, role, capacity, Some(metrics))
    })
}

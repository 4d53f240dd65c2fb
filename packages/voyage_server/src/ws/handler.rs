use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use voyage_hub::{Connection, VoyageMessage};

use crate::metrics::ServerMetrics;

use super::VoyageHub;
use super::connection::WsConnection;
use super::protocol::{FrameError, decode_client_frame, joined_text, left_text};

/// Run one voyage seat from upgrade to disconnect.
pub async fn handle_voyage_ws(
    socket: WebSocket,
    hub: Arc<VoyageHub>,
    voyage_id: String,
    role: String,
    send_channel_capacity: usize,
    server_metrics: Option<Arc<ServerMetrics>>,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Channel for frames headed to this client
    let (tx, mut rx) = mpsc::channel::<Message>(send_channel_capacity.max(1));
    let connection = Arc::new(WsConnection::new(tx));
    let conn_id = connection.id();

    info!(conn_id = %conn_id, voyage = %voyage_id, "[WS] New connection requesting role {}", role);

    if let Some(ref m) = server_metrics {
        m.connection_opened();
    }

    let admission = match hub.admit(&connection, &voyage_id, &role).await {
        Ok(admission) => admission,
        Err(e) => {
            if let Some(ref m) = server_metrics {
                m.connection_rejected();
            }
            match e.rejection() {
                Some(rejection) => {
                    let frame = CloseFrame {
                        code: rejection.code,
                        reason: rejection.reason.into(),
                    };
                    if let Err(e) = ws_sender.send(Message::Close(Some(frame))).await {
                        debug!(conn_id = %conn_id, "Failed to deliver rejection close frame: {}", e);
                    }
                }
                None => error!(conn_id = %conn_id, "Admission failed: {}", e),
            }
            if let Some(ref m) = server_metrics {
                m.connection_closed();
            }
            return;
        }
    };

    if let Some(ref m) = server_metrics {
        m.connection_admitted();
    }

    // Replay goes straight to the sink before the sender task starts, so it
    // lands ahead of any live frame already queued on the channel.
    let mut replay_ok = true;
    for frame in admission.history {
        if let Err(e) = ws_sender.send(Message::Text(frame.as_ref().into())).await {
            debug!(conn_id = %conn_id, "History replay failed: {}", e);
            replay_ok = false;
            break;
        }
    }

    // Task: drain the outbound channel into the socket
    let mut sender_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // A failed replay means the client is already gone. The seat was held
    // only for the replay, so neither the join nor the leave is announced.
    if replay_ok {
        announce(
            &hub,
            &voyage_id,
            VoyageMessage::system(joined_text(&role)),
            &server_metrics,
        )
        .await;
        broadcast_role_status(&hub, &voyage_id, &server_metrics).await;
    }

    // Task: read client frames and rebroadcast chat
    let input_task = async {
        if !replay_ok {
            return;
        }
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Some(ref m) = server_metrics {
                        m.message_received();
                    }
                    match decode_client_frame(text.as_str()) {
                        Ok(client_msg) => {
                            if let Some(claimed) = client_msg.role.as_deref() {
                                if claimed != role {
                                    debug!(
                                        conn_id = %conn_id,
                                        "Client claimed role {} but holds {}", claimed, role
                                    );
                                }
                            }
                            announce(
                                &hub,
                                &voyage_id,
                                VoyageMessage::human(role.as_str(), client_msg.content),
                                &server_metrics,
                            )
                            .await;
                        }
                        Err(FrameError::Empty) => {}
                        Err(e) => {
                            if let Some(ref m) = server_metrics {
                                m.malformed_frame();
                            }
                            debug!(conn_id = %conn_id, "Ignoring frame: {}", e);
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!(conn_id = %conn_id, "Client closed connection");
                    break;
                }
                Err(e) => {
                    if let Some(ref m) = server_metrics {
                        m.websocket_error();
                    }
                    warn!(conn_id = %conn_id, "WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    };

    tokio::select! {
        _ = &mut sender_task => debug!(conn_id = %conn_id, "Sender task ended"),
        _ = input_task => debug!(conn_id = %conn_id, "Input task ended"),
        _ = connection.evicted() => {
            if let Some(ref m) = server_metrics {
                m.connection_evicted();
            }
            warn!(conn_id = %conn_id, voyage = %voyage_id, "[WS] {} evicted after failed delivery", role);
        }
    }

    // Leave before announcing so the seat is free once others hear about it
    hub.remove(&connection, &voyage_id, &role).await;
    if replay_ok {
        announce(
            &hub,
            &voyage_id,
            VoyageMessage::system(left_text(&role)),
            &server_metrics,
        )
        .await;
        broadcast_role_status(&hub, &voyage_id, &server_metrics).await;
    }

    sender_task.abort();

    if let Some(ref m) = server_metrics {
        m.connection_closed();
    }
    info!(conn_id = %conn_id, voyage = %voyage_id, "[WS] {} disconnected", role);
}

async fn announce(
    hub: &VoyageHub,
    voyage_id: &str,
    message: VoyageMessage,
    server_metrics: &Option<Arc<ServerMetrics>>,
) {
    if let Err(e) = hub.broadcast(&message, voyage_id).await {
        error!(voyage = %voyage_id, "Failed to broadcast {} message: {}", message.kind(), e);
        return;
    }
    if let Some(m) = server_metrics {
        m.broadcast_sent();
    }
}

async fn broadcast_role_status(
    hub: &VoyageHub,
    voyage_id: &str,
    server_metrics: &Option<Arc<ServerMetrics>>,
) {
    let status = hub.role_status(voyage_id).await;
    announce(hub, voyage_id, VoyageMessage::role_status(status), server_metrics).await;
}

//! Connection Hub
//!
//! Owns the room registry and serializes every check-and-mutate on it behind
//! one async mutex. Broadcasts only take a member snapshot under the lock;
//! sends happen afterwards, concurrently, each bounded by a timeout.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::connection::{Connection, ConnectionId};
use crate::error::{HubError, SendError};
use crate::message::{RoleStatus, VoyageMessage};
use crate::registry::{Member, RoomRegistry};

/// Default per-recipient send timeout
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Default number of recent broadcasts kept per room
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Construction-time hub settings. Not hot-reloadable.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Roles with at most one occupant per room
    pub limited_roles: Vec<String>,
    /// Upper bound on how long one recipient may hold up a broadcast
    pub send_timeout: Duration,
    /// Recent broadcasts replayed to late joiners (0 = disabled)
    pub history_limit: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            limited_roles: vec![
                "Captain".to_string(),
                "Scavenger".to_string(),
                "Mechanic".to_string(),
            ],
            send_timeout: DEFAULT_SEND_TIMEOUT,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Result of a successful admission.
#[derive(Debug, Clone, Default)]
pub struct Admission {
    /// Room history as of the admission instant, oldest first. Every
    /// broadcast issued after `admit` returns reaches the connection live,
    /// so replaying this first yields no gaps and no duplicates.
    pub history: Vec<Arc<str>>,
}

pub struct ConnectionHub<C> {
    limited_roles: Vec<String>,
    send_timeout: Duration,
    registry: Mutex<RoomRegistry<C>>,
}

impl<C: Connection> ConnectionHub<C> {
    pub fn new(config: HubConfig) -> Self {
        let mut limited_roles = Vec::with_capacity(config.limited_roles.len());
        for role in config.limited_roles {
            if !limited_roles.contains(&role) {
                limited_roles.push(role);
            }
        }
        Self {
            limited_roles,
            send_timeout: config.send_timeout,
            registry: Mutex::new(RoomRegistry::new(config.history_limit)),
        }
    }

    pub fn limited_roles(&self) -> &[String] {
        &self.limited_roles
    }

    pub fn is_limited(&self, role: &str) -> bool {
        self.limited_roles.iter().any(|r| r == role)
    }

    /// Admit a connection into a room under the given role.
    ///
    /// Fails with [`HubError::RoleOccupied`] if `role` is limited and already
    /// held in this room; in that case the connection is not recorded
    /// anywhere and the caller should close it with [`HubError::rejection`].
    /// Performs no transport I/O.
    pub async fn admit(
        &self,
        connection: &Arc<C>,
        room: &str,
        role: &str,
    ) -> Result<Admission, HubError> {
        let id = connection.id();
        let mut registry = self.registry.lock().await;
        let state = registry.room_or_create(room);

        if self.is_limited(role) {
            if let Err(holder) = state.occupy(role, id) {
                info!(
                    room = %room,
                    conn_id = %id,
                    holder = %holder,
                    "[ROLE] Connection denied: {} is already occupied",
                    role
                );
                return Err(HubError::RoleOccupied {
                    room: room.to_string(),
                    role: role.to_string(),
                });
            }
            info!(room = %room, conn_id = %id, "[ROLE] Role assigned: {}", role);
        }

        if !state.insert_member(id, Arc::downgrade(connection)) {
            debug!(room = %room, conn_id = %id, "[HUB] Connection already a member");
        }

        Ok(Admission {
            history: state.history(),
        })
    }

    /// Remove a connection from a room. Absent rooms or connections are a
    /// no-op. A limited role is freed only if this exact connection holds it.
    pub async fn remove(&self, connection: &C, room: &str, role: &str) {
        let id = connection.id();
        let mut registry = self.registry.lock().await;
        let Some(state) = registry.room_mut(room) else {
            return;
        };

        if state.remove_member(id) {
            debug!(room = %room, conn_id = %id, "[HUB] Connection removed");
        }
        if self.is_limited(role) && state.release_if_held_by(role, id) {
            info!(room = %room, conn_id = %id, "[ROLE] Role freed: {}", role);
        }
        // Same connection admitted under a second limited role
        for other in state.release_all_held_by(id) {
            info!(room = %room, conn_id = %id, "[ROLE] Role freed: {}", other);
        }
    }

    /// Fan a message out to every current member of `room`.
    ///
    /// The message is serialized once. Recipients whose send fails or
    /// exceeds the send timeout are pruned afterwards; their failures are not
    /// reported to the caller. Only a serialization error is returned.
    pub async fn broadcast(&self, message: &VoyageMessage, room: &str) -> Result<(), HubError> {
        let frame: Arc<str> = serde_json::to_string(message)?.into();

        let recipients = {
            let mut registry = self.registry.lock().await;
            let Some(state) = registry.room_mut(room) else {
                debug!(room = %room, "[HUB] Broadcast to unknown room dropped");
                return Ok(());
            };
            if message.is_replayable() {
                state.record(frame.clone());
            }
            state.snapshot()
        };

        if recipients.is_empty() {
            return Ok(());
        }

        let recipient_count = recipients.len();
        let results = join_all(
            recipients
                .into_iter()
                .map(|member| self.deliver(member, frame.clone())),
        )
        .await;

        let failed: Vec<Member<C>> = results
            .into_iter()
            .filter_map(|(member, result)| match result {
                Ok(()) => None,
                Err(e) => {
                    debug!(room = %room, conn_id = %member.id, "[HUB] Send failed: {}", e);
                    Some(member)
                }
            })
            .collect();

        debug!(
            room = %room,
            kind = message.kind(),
            "[HUB] Broadcast delivered to {}/{} members",
            recipient_count - failed.len(),
            recipient_count
        );

        if !failed.is_empty() {
            self.prune(room, &failed).await;
        }
        Ok(())
    }

    async fn deliver(&self, member: Member<C>, frame: Arc<str>) -> (Member<C>, Result<(), SendError>) {
        let Some(connection) = member.handle.upgrade() else {
            return (member, Err(SendError::Closed));
        };
        let result = match tokio::time::timeout(self.send_timeout, connection.send_text(frame)).await {
            Ok(result) => result,
            Err(_) => Err(SendError::Timeout(self.send_timeout)),
        };
        (member, result)
    }

    /// Drop members whose delivery failed, then evict the ones still alive so
    /// their sessions end instead of acting under a role they no longer hold.
    /// A role is released only when held by that same connection, so
    /// occupancy never points at a non-member.
    async fn prune(&self, room: &str, failed: &[Member<C>]) {
        {
            let mut registry = self.registry.lock().await;
            let Some(state) = registry.room_mut(room) else {
                return;
            };
            for member in failed {
                let id = member.id;
                if state.remove_member(id) {
                    warn!(room = %room, conn_id = %id, "[HUB] Pruned unreachable connection");
                }
                for role in state.release_all_held_by(id) {
                    info!(room = %room, conn_id = %id, "[ROLE] Role freed after failed send: {}", role);
                }
            }
        }

        for member in failed {
            if let Some(connection) = member.handle.upgrade() {
                debug!(room = %room, conn_id = %member.id, "[HUB] Evicting connection");
                connection.evict();
            }
        }
    }

    /// Occupancy of every configured limited role. Unknown rooms are all vacant.
    pub async fn role_status(&self, room: &str) -> RoleStatus {
        let registry = self.registry.lock().await;
        let state = registry.room(room);
        self.limited_roles
            .iter()
            .map(|role| {
                let occupied = state.is_some_and(|s| s.occupant(role).is_some());
                (role.clone(), occupied)
            })
            .collect()
    }

    /// Current members of a room in broadcast order.
    pub async fn members(&self, room: &str) -> Vec<ConnectionId> {
        let registry = self.registry.lock().await;
        registry.room(room).map(|s| s.member_ids()).unwrap_or_default()
    }

    pub async fn member_count(&self, room: &str) -> usize {
        let registry = self.registry.lock().await;
        registry.room(room).map(|s| s.member_count()).unwrap_or(0)
    }

    /// Number of rooms ever admitted into (rooms are never reaped).
    pub async fn room_count(&self) -> usize {
        self.registry.lock().await.room_count()
    }

    pub async fn recent_history(&self, room: &str) -> Vec<Arc<str>> {
        let registry = self.registry.lock().await;
        registry.room(room).map(|s| s.history()).unwrap_or_default()
    }
}

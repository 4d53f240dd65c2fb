//! Room Registry
//!
//! Plain data: room id → membership, limited-role occupancy and recent
//! history. No locking here; [`crate::ConnectionHub`] owns the registry
//! behind its mutex and is the only thing that mutates it.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::connection::ConnectionId;
use crate::history::RecentHistory;

/// Opaque room ("voyage") identifier.
pub type RoomId = String;

/// Non-owning reference to a member connection.
pub(crate) struct Member<C> {
    pub id: ConnectionId,
    pub handle: Weak<C>,
}

impl<C> Clone for Member<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handle: self.handle.clone(),
        }
    }
}

/// Per-room state.
pub(crate) struct RoomState<C> {
    /// Insertion order is broadcast order
    members: Vec<Member<C>>,
    /// Limited role name -> occupying connection (absent = vacant)
    role_occupants: HashMap<String, ConnectionId>,
    history: RecentHistory,
}

impl<C> RoomState<C> {
    fn new(history_limit: usize) -> Self {
        Self {
            members: Vec::new(),
            role_occupants: HashMap::new(),
            history: RecentHistory::new(history_limit),
        }
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    /// Append a member. Returns false (and changes nothing) if already present.
    pub fn insert_member(&mut self, id: ConnectionId, handle: Weak<C>) -> bool {
        if self.contains(id) {
            return false;
        }
        self.members.push(Member { id, handle });
        true
    }

    /// Returns true if the connection was a member.
    pub fn remove_member(&mut self, id: ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id != id);
        self.members.len() != before
    }

    pub fn occupant(&self, role: &str) -> Option<ConnectionId> {
        self.role_occupants.get(role).copied()
    }

    /// Claim a vacant role. Returns the current holder if it is taken.
    pub fn occupy(&mut self, role: &str, id: ConnectionId) -> Result<(), ConnectionId> {
        if let Some(holder) = self.occupant(role) {
            return Err(holder);
        }
        self.role_occupants.insert(role.to_string(), id);
        Ok(())
    }

    /// Vacate `role` only if `id` is the one holding it.
    pub fn release_if_held_by(&mut self, role: &str, id: ConnectionId) -> bool {
        if self.occupant(role) == Some(id) {
            self.role_occupants.remove(role);
            true
        } else {
            false
        }
    }

    /// Vacate every role held by `id`, returning the freed role names.
    pub fn release_all_held_by(&mut self, id: ConnectionId) -> Vec<String> {
        let freed: Vec<String> = self
            .role_occupants
            .iter()
            .filter(|(_, holder)| **holder == id)
            .map(|(role, _)| role.clone())
            .collect();
        for role in &freed {
            self.role_occupants.remove(role);
        }
        freed
    }

    /// Copy of the member list for delivery outside the lock.
    pub fn snapshot(&self) -> Vec<Member<C>> {
        self.members.clone()
    }

    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.members.iter().map(|m| m.id).collect()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn record(&mut self, frame: Arc<str>) {
        self.history.push(frame);
    }

    pub fn history(&self) -> Vec<Arc<str>> {
        self.history.snapshot()
    }
}

/// All rooms seen by this process. Entries are created on first admission
/// and never pruned.
pub(crate) struct RoomRegistry<C> {
    rooms: HashMap<RoomId, RoomState<C>>,
    history_limit: usize,
}

impl<C> RoomRegistry<C> {
    pub fn new(history_limit: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            history_limit,
        }
    }

    pub fn room(&self, room: &str) -> Option<&RoomState<C>> {
        self.rooms.get(room)
    }

    pub fn room_mut(&mut self, room: &str) -> Option<&mut RoomState<C>> {
        self.rooms.get_mut(room)
    }

    /// Get a room's state, creating an empty one on first use.
    pub fn room_or_create(&mut self, room: &str) -> &mut RoomState<C> {
        let history_limit = self.history_limit;
        self.rooms
            .entry(room.to_string())
            .or_insert_with(|| RoomState::new(history_limit))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> (Arc<()>, Weak<()>) {
        let strong = Arc::new(());
        let weak = Arc::downgrade(&strong);
        (strong, weak)
    }

    #[test]
    fn test_room_created_on_demand() {
        let mut registry: RoomRegistry<()> = RoomRegistry::new(10);
        assert!(registry.room("space").is_none());

        registry.room_or_create("space");
        assert!(registry.room("space").is_some());
        assert_eq!(registry.room_count(), 1);

        // Second call reuses the entry
        registry.room_or_create("space");
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn test_insert_member_is_unique() {
        let mut registry: RoomRegistry<()> = RoomRegistry::new(10);
        let (_strong, weak) = handle();
        let id = ConnectionId::next();

        let room = registry.room_or_create("space");
        assert!(room.insert_member(id, weak.clone()));
        assert!(!room.insert_member(id, weak));
        assert_eq!(room.member_count(), 1);
    }

    #[test]
    fn test_remove_member() {
        let mut registry: RoomRegistry<()> = RoomRegistry::new(10);
        let (_strong, weak) = handle();
        let id = ConnectionId::next();

        let room = registry.room_or_create("space");
        room.insert_member(id, weak);
        assert!(room.remove_member(id));
        assert!(!room.remove_member(id));
        assert!(!room.contains(id));
    }

    #[test]
    fn test_occupy_conflict_reports_holder() {
        let mut registry: RoomRegistry<()> = RoomRegistry::new(10);
        let first = ConnectionId::next();
        let second = ConnectionId::next();

        let room = registry.room_or_create("space");
        assert!(room.occupy("Captain", first).is_ok());
        assert_eq!(room.occupy("Captain", second), Err(first));
        assert_eq!(room.occupant("Captain"), Some(first));
    }

    #[test]
    fn test_release_checks_identity() {
        let mut registry: RoomRegistry<()> = RoomRegistry::new(10);
        let stale = ConnectionId::next();
        let current = ConnectionId::next();

        let room = registry.room_or_create("space");
        room.occupy("Captain", current).unwrap();

        assert!(!room.release_if_held_by("Captain", stale));
        assert_eq!(room.occupant("Captain"), Some(current));

        assert!(room.release_if_held_by("Captain", current));
        assert_eq!(room.occupant("Captain"), None);
    }

    #[test]
    fn test_release_all_held_by() {
        let mut registry: RoomRegistry<()> = RoomRegistry::new(10);
        let a = ConnectionId::next();
        let b = ConnectionId::next();

        let room = registry.room_or_create("space");
        room.occupy("Captain", a).unwrap();
        room.occupy("Mechanic", b).unwrap();

        let freed = room.release_all_held_by(a);
        assert_eq!(freed, vec!["Captain".to_string()]);
        assert_eq!(room.occupant("Mechanic"), Some(b));
    }

    #[test]
    fn test_snapshot_preserves_insertion_order() {
        let mut registry: RoomRegistry<()> = RoomRegistry::new(10);
        let (_s1, w1) = handle();
        let (_s2, w2) = handle();
        let (_s3, w3) = handle();
        let ids = [ConnectionId::next(), ConnectionId::next(), ConnectionId::next()];

        let room = registry.room_or_create("space");
        room.insert_member(ids[0], w1);
        room.insert_member(ids[1], w2);
        room.insert_member(ids[2], w3);

        let snapshot: Vec<ConnectionId> = room.snapshot().iter().map(|m| m.id).collect();
        assert_eq!(snapshot, ids.to_vec());
        assert_eq!(room.member_ids(), ids.to_vec());
    }

    #[test]
    fn test_history_uses_registry_limit() {
        let mut registry: RoomRegistry<()> = RoomRegistry::new(2);
        let room = registry.room_or_create("space");
        room.record("one".into());
        room.record("two".into());
        room.record("three".into());

        let history = room.history();
        assert_eq!(history.len(), 2);
        assert_eq!(&*history[0], "two");
    }
}

//! Room table implementation
//!
//! Partitions connections into independently addressed rooms. A room is
//! created lazily when its first occupant joins and removed as soon as
//! the last occupant leaves, so ephemeral room names never accumulate.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::connection::{ConnectionId, PeerSender};
use super::error::RegistryError;

/// Opaque key identifying a room.
///
/// Taken verbatim from the `room` query parameter of the WebSocket
/// upgrade request. The only constraint is non-emptiness.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomKey(String);

impl RoomKey {
    /// Create a room key, rejecting the empty string
    pub fn new(key: impl Into<String>) -> Result<Self, RegistryError> {
        let key = key.into();
        if key.is_empty() {
            return Err(RegistryError::EmptyRoomKey);
        }
        Ok(Self(key))
    }

    /// The raw key string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Membership of a single room
#[derive(Default)]
struct Room {
    members: HashMap<ConnectionId, PeerSender>,
}

/// Table of all active rooms
///
/// Thread-safe via a two-level `RwLock`: the outer map is only write-locked
/// to create or delete a room, while membership reads and writes take the
/// per-room lock. Operations on independent rooms never contend.
pub struct RoomTable {
    rooms: RwLock<HashMap<RoomKey, Arc<RwLock<Room>>>>,
}

impl RoomTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection to a room, creating the room on first join.
    ///
    /// The outer read guard is held across the member insert so a
    /// concurrent `leave` cannot delete the room out from under it.
    pub async fn join(&self, key: &RoomKey, id: ConnectionId, sender: PeerSender) {
        {
            let rooms = self.rooms.read().await;
            if let Some(room) = rooms.get(key) {
                let mut room = room.write().await;
                room.members.insert(id, sender);

                tracing::info!(
                    room = %key,
                    session_id = id,
                    members = room.members.len(),
                    "Peer joined (existing room)"
                );
                return;
            }
        }

        let mut rooms = self.rooms.write().await;
        let room = rooms
            .entry(key.clone())
            .or_insert_with(|| Arc::new(RwLock::new(Room::default())));
        let mut room = room.write().await;
        room.members.insert(id, sender);

        tracing::info!(
            room = %key,
            session_id = id,
            members = room.members.len(),
            "Peer joined (new room)"
        );
    }

    /// Remove a connection from a room, deleting the room when it
    /// becomes empty. Returns whether the room was deleted.
    pub async fn leave(&self, key: &RoomKey, id: ConnectionId) -> bool {
        let mut rooms = self.rooms.write().await;

        let Some(room) = rooms.get(key).cloned() else {
            return false;
        };

        let remaining = {
            let mut room = room.write().await;
            room.members.remove(&id);
            room.members.len()
        };

        if remaining == 0 {
            rooms.remove(key);
            tracing::info!(room = %key, session_id = id, "Peer left, room removed");
            true
        } else {
            tracing::info!(
                room = %key,
                session_id = id,
                members = remaining,
                "Peer left"
            );
            false
        }
    }

    /// Current member identifiers of a room
    pub async fn members(&self, key: &RoomKey) -> Vec<ConnectionId> {
        let rooms = self.rooms.read().await;

        if let Some(room) = rooms.get(key) {
            room.read().await.members.keys().copied().collect()
        } else {
            Vec::new()
        }
    }

    /// Outbound handle of a specific member, for addressed delivery.
    ///
    /// Returns `None` when the peer is not (or no longer) in this room;
    /// the caller treats that as an expected departure race, not an error.
    pub async fn lookup(&self, key: &RoomKey, id: ConnectionId) -> Option<PeerSender> {
        let rooms = self.rooms.read().await;
        let room = rooms.get(key)?;
        let room = room.read().await;
        room.members.get(&id).cloned()
    }

    /// Snapshot of a room's membership minus one connection, taken under
    /// the room lock so fan-out sees a consistent recipient set.
    pub async fn recipients(
        &self,
        key: &RoomKey,
        exclude: ConnectionId,
    ) -> Vec<(ConnectionId, PeerSender)> {
        let rooms = self.rooms.read().await;

        if let Some(room) = rooms.get(key) {
            room.read()
                .await
                .members
                .iter()
                .filter(|(id, _)| **id != exclude)
                .map(|(id, sender)| (*id, sender.clone()))
                .collect()
        } else {
            Vec::new()
        }
    }

    /// Number of members in a room (0 when the room does not exist)
    pub async fn member_count(&self, key: &RoomKey) -> usize {
        let rooms = self.rooms.read().await;

        if let Some(room) = rooms.get(key) {
            room.read().await.members.len()
        } else {
            0
        }
    }

    /// Whether the room currently exists
    pub async fn contains(&self, key: &RoomKey) -> bool {
        self.rooms.read().await.contains_key(key)
    }

    /// Total number of active rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl Default for RoomTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> RoomKey {
        RoomKey::new(name).unwrap()
    }

    fn sender() -> PeerSender {
        PeerSender::channel(4).0
    }

    #[test]
    fn test_empty_room_key_rejected() {
        assert_eq!(RoomKey::new(""), Err(RegistryError::EmptyRoomKey));
        assert!(RoomKey::new("r1").is_ok());
    }

    #[tokio::test]
    async fn test_room_created_on_first_join() {
        let table = RoomTable::new();
        let r1 = key("r1");

        assert!(!table.contains(&r1).await);

        table.join(&r1, 1, sender()).await;
        assert!(table.contains(&r1).await);
        assert_eq!(table.member_count(&r1).await, 1);
        assert_eq!(table.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_room_removed_when_last_member_leaves() {
        let table = RoomTable::new();
        let r1 = key("r1");

        table.join(&r1, 1, sender()).await;
        table.join(&r1, 2, sender()).await;

        assert!(!table.leave(&r1, 1).await);
        assert!(table.contains(&r1).await);

        assert!(table.leave(&r1, 2).await);
        assert!(!table.contains(&r1).await);
        assert_eq!(table.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_no_zero_member_room_survives() {
        let table = RoomTable::new();
        let r1 = key("r1");

        for round in 0..3u64 {
            let id = round + 1;
            table.join(&r1, id, sender()).await;
            table.leave(&r1, id).await;
            assert_eq!(table.room_count().await, 0);
        }
    }

    #[tokio::test]
    async fn test_lookup_scoped_to_room() {
        let table = RoomTable::new();
        let r1 = key("r1");
        let r2 = key("r2");

        table.join(&r1, 1, sender()).await;
        table.join(&r2, 2, sender()).await;

        assert!(table.lookup(&r1, 1).await.is_some());
        // Member of a different room is invisible here.
        assert!(table.lookup(&r1, 2).await.is_none());
        // Departed/unknown member is a miss, not an error.
        assert!(table.lookup(&r1, 99).await.is_none());
    }

    #[tokio::test]
    async fn test_recipients_exclude_sender() {
        let table = RoomTable::new();
        let r1 = key("r1");

        table.join(&r1, 1, sender()).await;
        table.join(&r1, 2, sender()).await;
        table.join(&r1, 3, sender()).await;

        let mut ids: Vec<ConnectionId> = table
            .recipients(&r1, 2)
            .await
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        ids.sort_unstable();

        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_recipients_of_unknown_room_is_empty() {
        let table = RoomTable::new();
        assert!(table.recipients(&key("ghost"), 1).await.is_empty());
        assert!(table.members(&key("ghost")).await.is_empty());
    }

    #[tokio::test]
    async fn test_leave_unknown_room_is_noop() {
        let table = RoomTable::new();
        assert!(!table.leave(&key("ghost"), 1).await);
    }

    #[tokio::test]
    async fn test_rooms_are_independent() {
        let table = RoomTable::new();
        let r1 = key("r1");
        let r2 = key("r2");

        table.join(&r1, 1, sender()).await;
        table.join(&r2, 2, sender()).await;
        table.leave(&r1, 1).await;

        assert!(!table.contains(&r1).await);
        assert!(table.contains(&r2).await);
        assert_eq!(table.member_count(&r2).await, 1);
    }
}

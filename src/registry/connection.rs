//! Connection registry implementation
//!
//! Assigns every accepted connection a process-unique identifier and
//! tracks which connections are currently live.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::RwLock;

use super::room::RoomKey;

/// Unique identifier for a connection.
///
/// Allocated from a strictly increasing counter starting at 1 and never
/// reused while the process runs.
pub type ConnectionId = u64;

/// Outbound handle for a single peer.
///
/// Wraps the bounded channel drained by the peer's socket writer task.
/// Cheap to clone, so rooms hand out copies for fan-out without holding
/// any lock during the actual send.
#[derive(Debug, Clone)]
pub struct PeerSender {
    tx: mpsc::Sender<String>,
}

impl PeerSender {
    /// Create a sender together with the receiver its writer task drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Queue a serialized frame for delivery.
    ///
    /// Never blocks: a peer whose queue is full (or whose writer has
    /// exited) simply misses the frame. Returns whether the frame was
    /// accepted.
    pub fn send(&self, frame: String) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!("Outbound queue full, frame dropped");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Whether the peer's writer task has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

struct ConnectionEntry {
    sender: PeerSender,
    room: RoomKey,
}

/// Registry of live connections
///
/// Identifier allocation is lock-free; the liveness map is behind a
/// `RwLock` shared by every connection task.
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    connections: RwLock<HashMap<ConnectionId, ConnectionEntry>>,
}

impl ConnectionRegistry {
    /// Create an empty registry. The first identifier handed out is 1.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection and assign it the next unused identifier
    pub async fn register(&self, sender: PeerSender, room: RoomKey) -> ConnectionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(session_id = id, room = %room, "Connection registered");

        self.connections
            .write()
            .await
            .insert(id, ConnectionEntry { sender, room });

        id
    }

    /// Remove a connection. Returns whether it was registered.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.connections.write().await.remove(&id).is_some();

        if removed {
            tracing::debug!(session_id = id, "Connection unregistered");
        }

        removed
    }

    /// Whether the connection is currently live
    pub async fn is_registered(&self, id: ConnectionId) -> bool {
        self.connections.read().await.contains_key(&id)
    }

    /// Outbound handle for a live connection
    pub async fn peer(&self, id: ConnectionId) -> Option<PeerSender> {
        self.connections
            .read()
            .await
            .get(&id)
            .map(|entry| entry.sender.clone())
    }

    /// Room the connection joined on accept
    pub async fn room_of(&self, id: ConnectionId) -> Option<RoomKey> {
        self.connections
            .read()
            .await
            .get(&id)
            .map(|entry| entry.room.clone())
    }

    /// Number of live connections
    pub async fn active_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

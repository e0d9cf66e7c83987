//! Connection teardown
//!
//! When a peer's transport closes, the remaining members of its room are
//! told about the departure before any state is removed, then the
//! connection is scrubbed from the room table and the registry.

use std::sync::Arc;

use crate::protocol::SignalMessage;
use crate::registry::{ConnectionId, ConnectionRegistry, RoomKey, RoomTable};
use crate::stats::RelayStats;

use super::router::MessageRouter;

/// Cleans up after closed transports
#[derive(Clone)]
pub struct LifecycleManager {
    rooms: Arc<RoomTable>,
    registry: Arc<ConnectionRegistry>,
    stats: Arc<RelayStats>,
    router: MessageRouter,
}

impl LifecycleManager {
    /// Create a lifecycle manager over the shared relay state
    pub fn new(
        rooms: Arc<RoomTable>,
        registry: Arc<ConnectionRegistry>,
        stats: Arc<RelayStats>,
    ) -> Self {
        let router = MessageRouter::new(Arc::clone(&rooms), Arc::clone(&stats));
        Self {
            rooms,
            registry,
            stats,
            router,
        }
    }

    /// Handle the closure of connection `id` in `room`.
    ///
    /// The departure notice is computed against room membership before
    /// the connection is removed, and the departing connection itself is
    /// excluded from the recipient set (its transport is already gone).
    pub async fn on_disconnect(&self, room: &RoomKey, id: ConnectionId) {
        let notice = SignalMessage::leave_notice(id);
        let notified = self.router.broadcast_from(room, id, &notice).await;
        self.stats.record_leave_notice();

        let room_removed = self.rooms.leave(room, id).await;
        self.registry.unregister(id).await;

        tracing::info!(
            room = %room,
            session_id = id,
            notified = notified,
            room_removed = room_removed,
            "Connection closed"
        );
    }
}

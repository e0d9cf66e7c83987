//! Message router implementation
//!
//! Turns raw inbound frames into deliveries: parse, stamp the sender
//! identity, then either unicast to the addressed peer or fan out to the
//! rest of the sender's room.

use std::sync::Arc;

use crate::protocol::SignalMessage;
use crate::registry::{ConnectionId, PeerSender, RoomKey, RoomTable};
use crate::stats::RelayStats;

/// Routes frames between peers of a room
///
/// Cheap to construct (two `Arc` clones), so every connection task owns
/// its own router. Because a connection's frames are routed serially from
/// its read loop and each recipient has its own FIFO queue, delivery to
/// any given recipient preserves the order frames arrived from a sender.
#[derive(Clone)]
pub struct MessageRouter {
    rooms: Arc<RoomTable>,
    stats: Arc<RelayStats>,
}

impl MessageRouter {
    /// Create a router over the shared room table
    pub fn new(rooms: Arc<RoomTable>, stats: Arc<RelayStats>) -> Self {
        Self { rooms, stats }
    }

    /// Parse an inbound frame and stamp it with the sender's identity.
    ///
    /// Returns `None` for unparseable frames, which are logged and
    /// counted but never tear down the sender's connection.
    pub fn prepare(&self, sender: ConnectionId, raw: &str) -> Option<SignalMessage> {
        match SignalMessage::parse(raw) {
            Ok(mut msg) => {
                msg.stamp_sender(sender);
                Some(msg)
            }
            Err(e) => {
                tracing::debug!(session_id = sender, error = %e, "Malformed frame dropped");
                self.stats.record_malformed();
                None
            }
        }
    }

    /// Deliver a prepared message: unicast when addressed, otherwise
    /// broadcast to the rest of the sender's room.
    pub async fn dispatch(&self, room: &RoomKey, sender: ConnectionId, msg: &SignalMessage) {
        match msg.recipient() {
            Some(to) => self.unicast(room, sender, to, msg).await,
            None => {
                self.broadcast_from(room, sender, msg).await;
            }
        }
    }

    /// Parse, stamp, and deliver one raw frame
    pub async fn route(&self, room: &RoomKey, sender: ConnectionId, raw: &str) {
        if let Some(msg) = self.prepare(sender, raw) {
            self.dispatch(room, sender, &msg).await;
        }
    }

    /// Send a message to every member of `room` except `exclude`.
    ///
    /// Each delivery is independent and best-effort: one full or departed
    /// recipient queue does not affect the rest of the fan-out. Returns
    /// the number of deliveries accepted.
    pub async fn broadcast_from(
        &self,
        room: &RoomKey,
        exclude: ConnectionId,
        msg: &SignalMessage,
    ) -> usize {
        let Ok(text) = msg.to_text() else {
            return 0;
        };

        let recipients = self.rooms.recipients(room, exclude).await;
        self.stats.record_broadcast();

        let mut delivered = 0;
        for (id, peer) in recipients {
            if self.deliver(id, &peer, text.clone()) {
                delivered += 1;
            }
        }

        tracing::trace!(
            room = %room,
            session_id = exclude,
            delivered = delivered,
            "Broadcast"
        );

        delivered
    }

    async fn unicast(
        &self,
        room: &RoomKey,
        sender: ConnectionId,
        to: ConnectionId,
        msg: &SignalMessage,
    ) {
        let Ok(text) = msg.to_text() else {
            return;
        };

        // Only members of the sender's own room are addressable.
        match self.rooms.lookup(room, to).await {
            Some(peer) => {
                self.stats.record_unicast();
                self.deliver(to, &peer, text);
            }
            None => {
                // Expected race between departure and in-flight frames.
                tracing::trace!(
                    room = %room,
                    session_id = sender,
                    to = to,
                    "Unicast target not in room, dropped"
                );
                self.stats.record_unicast_miss();
            }
        }
    }

    fn deliver(&self, id: ConnectionId, peer: &PeerSender, text: String) -> bool {
        let accepted = peer.send(text);
        if !accepted {
            tracing::debug!(session_id = id, "Delivery dropped");
        }
        self.stats.record_delivery(accepted);
        accepted
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    struct Peer {
        id: ConnectionId,
        rx: mpsc::Receiver<String>,
    }

    impl Peer {
        async fn join(table: &RoomTable, room: &RoomKey, id: ConnectionId) -> Self {
            let (sender, rx) = PeerSender::channel(8);
            table.join(room, id, sender).await;
            Self { id, rx }
        }

        fn recv(&mut self) -> Option<serde_json::Value> {
            self.rx
                .try_recv()
                .ok()
                .and_then(|text| serde_json::from_str(&text).ok())
        }
    }

    fn key(name: &str) -> RoomKey {
        RoomKey::new(name).unwrap()
    }

    fn router(rooms: &Arc<RoomTable>) -> (MessageRouter, Arc<RelayStats>) {
        let stats = Arc::new(RelayStats::new());
        (MessageRouter::new(Arc::clone(rooms), Arc::clone(&stats)), stats)
    }

    #[tokio::test]
    async fn test_broadcast_excludes_sender() {
        let rooms = Arc::new(RoomTable::new());
        let r1 = key("r1");
        let (router, _) = router(&rooms);

        let mut a = Peer::join(&rooms, &r1, 1).await;
        let mut b = Peer::join(&rooms, &r1, 2).await;
        let mut c = Peer::join(&rooms, &r1, 3).await;

        router.route(&r1, a.id, r#"{"type":"join"}"#).await;

        assert!(a.recv().is_none());
        assert_eq!(b.recv().unwrap()["id"], 1);
        assert_eq!(c.recv().unwrap()["type"], "join");
    }

    #[tokio::test]
    async fn test_broadcast_never_crosses_rooms() {
        let rooms = Arc::new(RoomTable::new());
        let r1 = key("r1");
        let r2 = key("r2");
        let (router, _) = router(&rooms);

        let a = Peer::join(&rooms, &r1, 1).await;
        let mut other = Peer::join(&rooms, &r2, 2).await;

        router.route(&r1, a.id, r#"{"type":"join"}"#).await;

        assert!(other.recv().is_none());
    }

    #[tokio::test]
    async fn test_unicast_reaches_target_only() {
        let rooms = Arc::new(RoomTable::new());
        let r1 = key("r1");
        let (router, stats) = router(&rooms);

        let a = Peer::join(&rooms, &r1, 1).await;
        let mut b = Peer::join(&rooms, &r1, 2).await;
        let mut c = Peer::join(&rooms, &r1, 3).await;

        router
            .route(&r1, a.id, r#"{"type":"offer","to":2,"sdp":"v=0"}"#)
            .await;

        let got = b.recv().unwrap();
        assert_eq!(got["id"], 1);
        assert_eq!(got["to"], 2);
        assert_eq!(got["sdp"], "v=0");
        assert!(c.recv().is_none());
        assert_eq!(stats.snapshot().unicasts, 1);
    }

    #[tokio::test]
    async fn test_unicast_to_departed_peer_is_silent() {
        let rooms = Arc::new(RoomTable::new());
        let r1 = key("r1");
        let (router, stats) = router(&rooms);

        let a = Peer::join(&rooms, &r1, 1).await;

        router.route(&r1, a.id, r#"{"type":"offer","to":42}"#).await;

        let snap = stats.snapshot();
        assert_eq!(snap.unicast_misses, 1);
        assert_eq!(snap.deliveries, 0);
    }

    #[tokio::test]
    async fn test_unicast_cannot_cross_rooms() {
        let rooms = Arc::new(RoomTable::new());
        let r1 = key("r1");
        let r2 = key("r2");
        let (router, stats) = router(&rooms);

        let a = Peer::join(&rooms, &r1, 1).await;
        let mut other = Peer::join(&rooms, &r2, 2).await;

        router.route(&r1, a.id, r#"{"type":"offer","to":2}"#).await;

        assert!(other.recv().is_none());
        assert_eq!(stats.snapshot().unicast_misses, 1);
    }

    #[tokio::test]
    async fn test_malformed_frame_dropped_quietly() {
        let rooms = Arc::new(RoomTable::new());
        let r1 = key("r1");
        let (router, stats) = router(&rooms);

        let a = Peer::join(&rooms, &r1, 1).await;
        let mut b = Peer::join(&rooms, &r1, 2).await;

        router.route(&r1, a.id, "{oops").await;
        assert!(b.recv().is_none());
        assert_eq!(stats.snapshot().malformed_frames, 1);

        // Sender keeps working after a bad frame.
        router.route(&r1, a.id, r#"{"type":"join"}"#).await;
        assert_eq!(b.recv().unwrap()["type"], "join");
    }

    #[tokio::test]
    async fn test_sender_identity_stamped_over_client_claim() {
        let rooms = Arc::new(RoomTable::new());
        let r1 = key("r1");
        let (router, _) = router(&rooms);

        let a = Peer::join(&rooms, &r1, 1).await;
        let mut b = Peer::join(&rooms, &r1, 2).await;

        router.route(&r1, a.id, r#"{"type":"join","id":777}"#).await;

        assert_eq!(b.recv().unwrap()["id"], 1);
    }

    #[tokio::test]
    async fn test_per_recipient_order_preserved() {
        let rooms = Arc::new(RoomTable::new());
        let r1 = key("r1");
        let (router, _) = router(&rooms);

        let a = Peer::join(&rooms, &r1, 1).await;
        let mut b = Peer::join(&rooms, &r1, 2).await;

        for n in 0..5 {
            let raw = format!(r#"{{"type":"candidate","seq":{n}}}"#);
            router.route(&r1, a.id, &raw).await;
        }

        for n in 0..5 {
            assert_eq!(b.recv().unwrap()["seq"], n);
        }
    }

    #[tokio::test]
    async fn test_full_recipient_queue_does_not_block_fanout() {
        let rooms = Arc::new(RoomTable::new());
        let r1 = key("r1");
        let (router, stats) = router(&rooms);

        // Slow peer with a tiny queue that is already full.
        let (slow_sender, _slow_rx) = PeerSender::channel(1);
        assert!(slow_sender.send("stale".into()));
        rooms.join(&r1, 2, slow_sender).await;

        let a = Peer::join(&rooms, &r1, 1).await;
        let mut healthy = Peer::join(&rooms, &r1, 3).await;

        let delivered = router
            .broadcast_from(&r1, a.id, &SignalMessage::new("join"))
            .await;

        assert_eq!(delivered, 1);
        assert!(healthy.recv().is_some());
        assert_eq!(stats.snapshot().dropped_deliveries, 1);
    }
}

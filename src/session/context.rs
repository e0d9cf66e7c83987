//! Handler context
//!
//! Context passed to handler callbacks identifying the peer a callback
//! fires for.

use std::net::SocketAddr;

use crate::registry::{ConnectionId, RoomKey};

/// Context passed to [`RelayHandler`](crate::server::RelayHandler)
/// callbacks
///
/// Read-only identification of one connection; relay state is reached
/// through the server's registry and room table accessors instead.
#[derive(Debug, Clone)]
pub struct PeerContext {
    /// Unique connection id
    pub id: ConnectionId,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Room the peer was routed to on upgrade
    pub room: RoomKey,
}

impl PeerContext {
    /// Create a new context
    pub fn new(id: ConnectionId, peer_addr: SocketAddr, room: RoomKey) -> Self {
        Self {
            id,
            peer_addr,
            room,
        }
    }
}

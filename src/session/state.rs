//! Session state machine
//!
//! Tracks one connection from WebSocket accept to teardown. There is no
//! resume: a peer that reconnects gets a fresh identifier and rejoins
//! from scratch.

use std::net::SocketAddr;
use std::time::Instant;

use crate::registry::{ConnectionId, RoomKey};

/// Connection lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerPhase {
    /// WebSocket established, not yet a room member
    Connecting,
    /// Member of exactly one room, frames are routed
    Joined,
    /// Transport closed (terminal)
    Closed,
}

/// Per-connection session state
#[derive(Debug)]
pub struct PeerSession {
    /// Unique connection id
    pub id: ConnectionId,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Room selected by the upgrade request
    pub room: RoomKey,

    /// Current phase
    pub phase: PeerPhase,

    /// Connection accept time
    pub connected_at: Instant,

    /// Time the peer became a room member
    pub joined_at: Option<Instant>,

    /// Inbound frames seen on this connection
    pub frames_received: u64,
}

impl PeerSession {
    /// Create state for a freshly accepted connection
    pub fn new(id: ConnectionId, peer_addr: SocketAddr, room: RoomKey) -> Self {
        Self {
            id,
            peer_addr,
            room,
            phase: PeerPhase::Connecting,
            connected_at: Instant::now(),
            joined_at: None,
            frames_received: 0,
        }
    }

    /// Transition into room membership
    pub fn join(&mut self) {
        if self.phase == PeerPhase::Connecting {
            self.phase = PeerPhase::Joined;
            self.joined_at = Some(Instant::now());
        }
    }

    /// Terminal transition on transport closure
    pub fn close(&mut self) {
        self.phase = PeerPhase::Closed;
    }

    /// Whether frames from this peer are currently routed
    pub fn is_joined(&self) -> bool {
        self.phase == PeerPhase::Joined
    }

    /// Count one inbound frame
    pub fn record_frame(&mut self) {
        self.frames_received += 1;
    }

    /// Time since the connection was accepted
    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    fn session() -> PeerSession {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080);
        PeerSession::new(1, addr, RoomKey::new("r1").unwrap())
    }

    #[test]
    fn test_session_lifecycle() {
        let mut state = session();

        assert_eq!(state.phase, PeerPhase::Connecting);
        assert!(!state.is_joined());

        state.join();
        assert_eq!(state.phase, PeerPhase::Joined);
        assert!(state.is_joined());
        assert!(state.joined_at.is_some());

        state.close();
        assert_eq!(state.phase, PeerPhase::Closed);
        assert!(!state.is_joined());
    }

    #[test]
    fn test_join_only_from_connecting() {
        let mut state = session();

        state.close();
        state.join();

        assert_eq!(state.phase, PeerPhase::Closed);
        assert!(state.joined_at.is_none());
    }

    #[test]
    fn test_frame_counter() {
        let mut state = session();

        state.record_frame();
        state.record_frame();

        assert_eq!(state.frames_received, 2);
    }
}

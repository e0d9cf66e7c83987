//! Relay event handler
//!
//! Embedders observe and gate relay activity by implementing
//! [`RelayHandler`]. Every callback has a no-op default, so a handler
//! only overrides what it cares about.

use std::future::Future;

use crate::protocol::SignalMessage;
use crate::session::PeerContext;

/// Callbacks invoked by the relay server.
///
/// All callbacks run on the affected peer's connection task; keep them
/// short or hand work off to a separate task.
pub trait RelayHandler: Send + Sync + 'static {
    /// A peer completed the WebSocket handshake. Return `false` to
    /// reject it before it joins a room.
    fn on_connection(&self, _ctx: &PeerContext) -> impl Future<Output = bool> + Send {
        async { true }
    }

    /// The peer was added to its room and will now receive traffic
    fn on_join(&self, _ctx: &PeerContext) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// An inbound frame parsed and was stamped with the sender identity.
    /// Return `false` to drop it instead of routing.
    fn on_message(
        &self,
        _ctx: &PeerContext,
        _message: &SignalMessage,
    ) -> impl Future<Output = bool> + Send {
        async { true }
    }

    /// The peer's transport closed and its state has been cleaned up
    fn on_disconnect(&self, _ctx: &PeerContext) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Handler that accepts every connection and forwards every frame
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRelayHandler;

impl RelayHandler for DefaultRelayHandler {}

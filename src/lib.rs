//! WebSocket signaling relay for WebRTC mesh calls
//!
//! Browser (or native) peers connect over WebSocket, are partitioned
//! into rooms, and exchange opaque negotiation messages (offers,
//! answers, ICE candidates) either addressed to a single peer via the
//! `to` field or broadcast to the rest of the room. The media itself
//! flows peer-to-peer and never touches the relay.
//!
//! The relay stamps every forwarded frame with the sender's connection
//! id, so clients cannot spoof each other, and synthesizes a single
//! `{"type":"leave","id":N}` notice when a peer's transport closes.
//! Everything else in a frame passes through untouched.
//!
//! # Quick Start
//!
//! ```no_run
//! use signal_relay::{DefaultRelayHandler, ServerConfig, SignalServer};
//!
//! # async fn example() -> signal_relay::error::Result<()> {
//! let config = ServerConfig::default().max_connections(1024);
//! let server = SignalServer::new(config, DefaultRelayHandler);
//! server.run().await
//! # }
//! ```
//!
//! Peers connect to `ws://host:port/websocket?room=<key>`; connections
//! without a room parameter share one implicit room.

pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod routing;
pub mod server;
pub mod session;
pub mod stats;

pub use client::SignalClient;
pub use error::{Error, Result};
pub use protocol::SignalMessage;
pub use registry::{ConnectionId, ConnectionRegistry, PeerSender, RoomKey, RoomTable};
pub use routing::{LifecycleManager, MessageRouter};
pub use server::{DefaultRelayHandler, RelayHandler, ServerConfig, SignalServer};
pub use session::{PeerContext, PeerPhase, PeerSession};
pub use stats::{RelayStats, RelayStatsSnapshot};

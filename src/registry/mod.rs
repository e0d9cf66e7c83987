//! Shared relay state: connections and rooms
//!
//! The registry tracks every live connection and partitions them into
//! rooms. It is the only state shared between connection tasks.
//!
//! # Architecture
//!
//! ```text
//!        Arc<ConnectionRegistry>              Arc<RoomTable>
//!      ┌──────────────────────────┐   ┌───────────────────────────────┐
//!      │ next_id: AtomicU64       │   │ rooms: HashMap<RoomKey,       │
//!      │ connections:             │   │   Room {                      │
//!      │   HashMap<ConnectionId,  │   │     members:                  │
//!      │     { sender, room }>    │   │       HashMap<ConnectionId,   │
//!      └────────────┬─────────────┘   │         PeerSender>           │
//!                   │                 │   }                           │
//!                   │                 └───────────────┬───────────────┘
//!                   │                                 │
//!         ┌─────────┴─────────┬─────────────────────┬─┴───────────┐
//!         ▼                   ▼                     ▼             ▼
//!    [conn task 1]       [conn task 2]         [router]     [lifecycle]
//!    register/join       register/join         lookup /     leave notice,
//!    on accept           on accept             recipients   leave, unregister
//! ```
//!
//! # Non-Blocking Fan-Out
//!
//! A `PeerSender` is a bounded mpsc handle drained by that peer's socket
//! writer task. Broadcast snapshots clone the handles under the room lock
//! and deliver with `try_send` afterwards, so a slow or dead peer drops
//! frames instead of stalling the room.

pub mod connection;
pub mod error;
pub mod room;

pub use connection::{ConnectionId, ConnectionRegistry, PeerSender};
pub use error::RegistryError;
pub use room::{RoomKey, RoomTable};

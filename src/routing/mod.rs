//! Frame routing between peers
//!
//! The router carries each inbound frame to its recipients; the
//! lifecycle manager synthesizes the one message the relay originates
//! itself, the departure notice.
//!
//! # Delivery Semantics
//!
//! ```text
//!   frame from peer S in room R
//!            │ parse (drop on failure)
//!            │ stamp id = S
//!            ▼
//!      ┌─ has "to"? ─┐
//!      │yes          │no
//!      ▼             ▼
//!   lookup(R, to)  recipients(R) \ {S}
//!      │              │
//!      ▼              ▼
//!   one try_send   try_send to each, independently
//! ```
//!
//! Cross-recipient ordering is unspecified; per-recipient ordering of one
//! sender's frames is FIFO. No delivery attempt blocks or aborts another.

pub mod lifecycle;
pub mod router;

pub use lifecycle::LifecycleManager;
pub use router::MessageRouter;

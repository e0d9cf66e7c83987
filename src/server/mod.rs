//! WebSocket relay server
//!
//! This module provides:
//! - Server configuration with builder methods
//! - The TCP accept loop and per-connection driver tasks
//! - The handler trait embedders use to gate and observe traffic

pub mod config;
pub(crate) mod connection;
pub mod handler;
pub mod listener;

pub use config::ServerConfig;
pub use handler::{DefaultRelayHandler, RelayHandler};
pub use listener::SignalServer;

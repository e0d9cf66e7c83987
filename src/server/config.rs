//! Server configuration

use std::net::SocketAddr;

/// Default WebSocket upgrade path
pub const DEFAULT_WS_PATH: &str = "/websocket";

/// Default query parameter selecting the room
pub const DEFAULT_ROOM_PARAM: &str = "room";

/// Room used when the upgrade request carries no room parameter
pub const DEFAULT_ROOM: &str = "global";

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// HTTP path that accepts the WebSocket upgrade
    pub ws_path: String,

    /// Query parameter naming the room to join
    pub room_param: String,

    /// Room for connections without a room parameter
    pub default_room: String,

    /// Outbound frame queue length per peer; when full, further frames to
    /// that peer are dropped rather than stalling the room
    pub outbound_queue: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().unwrap(),
            max_connections: 0, // Unlimited
            ws_path: DEFAULT_WS_PATH.to_string(),
            room_param: DEFAULT_ROOM_PARAM.to_string(),
            default_room: DEFAULT_ROOM.to_string(),
            outbound_queue: 64,
            tcp_nodelay: true, // Signaling frames are small and latency-sensitive
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the WebSocket upgrade path
    pub fn ws_path(mut self, path: impl Into<String>) -> Self {
        self.ws_path = path.into();
        self
    }

    /// Set the room query parameter name
    pub fn room_param(mut self, param: impl Into<String>) -> Self {
        self.room_param = param.into();
        self
    }

    /// Set the implicit room for connections without a room parameter
    pub fn default_room(mut self, room: impl Into<String>) -> Self {
        self.default_room = room.into();
        self
    }

    /// Set the per-peer outbound queue length
    pub fn outbound_queue(mut self, capacity: usize) -> Self {
        self.outbound_queue = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.ws_path, "/websocket");
        assert_eq!(config.room_param, "room");
        assert_eq!(config.default_room, "global");
        assert_eq!(config.outbound_queue, 64);
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:9001".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr.port(), 9001);
    }

    #[test]
    fn test_builder_outbound_queue_floor() {
        // Zero-length queues would drop every frame.
        let config = ServerConfig::default().outbound_queue(0);

        assert_eq!(config.outbound_queue, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .max_connections(50)
            .ws_path("/signal")
            .room_param("channel")
            .default_room("lobby")
            .outbound_queue(128);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.ws_path, "/signal");
        assert_eq!(config.room_param, "channel");
        assert_eq!(config.default_room, "lobby");
        assert_eq!(config.outbound_queue, 128);
    }
}

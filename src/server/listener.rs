//! Relay server listener
//!
//! Handles the TCP accept loop and spawns one driver task per
//! connection.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::registry::{ConnectionRegistry, RoomTable};
use crate::server::config::ServerConfig;
use crate::server::connection::PeerConnection;
use crate::server::handler::RelayHandler;
use crate::stats::RelayStats;

/// Signaling relay server
pub struct SignalServer<H: RelayHandler> {
    config: ServerConfig,
    handler: Arc<H>,
    rooms: Arc<RoomTable>,
    registry: Arc<ConnectionRegistry>,
    stats: Arc<RelayStats>,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl<H: RelayHandler> SignalServer<H> {
    /// Create a new server with the given configuration and handler
    pub fn new(config: ServerConfig, handler: H) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            handler: Arc::new(handler),
            rooms: Arc::new(RoomTable::new()),
            registry: Arc::new(ConnectionRegistry::new()),
            stats: Arc::new(RelayStats::new()),
            connection_semaphore,
        }
    }

    /// Get a reference to the room table
    pub fn rooms(&self) -> &Arc<RoomTable> {
        &self.rooms
    }

    /// Get a reference to the connection registry
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Get a reference to the relay counters
    pub fn stats(&self) -> &Arc<RelayStats> {
        &self.stats
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            path = %self.config.ws_path,
            "Signaling relay listening"
        );

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        }
    }

    /// Run the accept loop on an already-bound listener.
    ///
    /// Useful when the caller needs the listener's local address first
    /// (for example binding port 0 in tests).
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        tracing::info!(
            addr = %listener.local_addr()?,
            path = %self.config.ws_path,
            "Signaling relay listening"
        );
        self.accept_loop(&listener).await
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    // Fatal only to this accept attempt, never the relay.
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        tracing::debug!(peer = %peer_addr, "Accepted TCP connection");

        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        let connection = PeerConnection::new(
            self.config.clone(),
            Arc::clone(&self.handler),
            Arc::clone(&self.rooms),
            Arc::clone(&self.registry),
            Arc::clone(&self.stats),
        );

        tokio::spawn(async move {
            // Hold the limit permit for the connection's whole lifetime.
            let _permit = permit;

            if let Err(e) = connection.run(socket, peer_addr).await {
                tracing::debug!(peer = %peer_addr, error = %e, "Connection error");
            }
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }

        Ok(())
    }
}

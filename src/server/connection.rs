//! Per-connection driver
//!
//! Runs the WebSocket upgrade (validating the path and extracting the
//! room key from the query string), then the connection's read loop. A
//! separate writer task drains the peer's bounded outbound queue into
//! the socket, keeping the send and receive paths independent.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;

use crate::error::Result;
use crate::registry::{ConnectionRegistry, PeerSender, RoomKey, RoomTable};
use crate::routing::{LifecycleManager, MessageRouter};
use crate::server::config::ServerConfig;
use crate::server::handler::RelayHandler;
use crate::session::{PeerContext, PeerSession};
use crate::stats::RelayStats;

/// Driver for one accepted socket
pub(crate) struct PeerConnection<H: RelayHandler> {
    config: ServerConfig,
    handler: Arc<H>,
    rooms: Arc<RoomTable>,
    registry: Arc<ConnectionRegistry>,
    stats: Arc<RelayStats>,
}

impl<H: RelayHandler> PeerConnection<H> {
    pub(crate) fn new(
        config: ServerConfig,
        handler: Arc<H>,
        rooms: Arc<RoomTable>,
        registry: Arc<ConnectionRegistry>,
        stats: Arc<RelayStats>,
    ) -> Self {
        Self {
            config,
            handler,
            rooms,
            registry,
            stats,
        }
    }

    /// Run the connection to completion: upgrade, join, route frames,
    /// clean up on closure.
    pub(crate) async fn run(self, socket: TcpStream, peer_addr: SocketAddr) -> Result<()> {
        // The handshake callback runs before the upgrade response is
        // written; it smuggles the room parameter out through the holder.
        let room_holder: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let ws = {
            let ws_path = self.config.ws_path.clone();
            let room_param = self.config.room_param.clone();
            let holder = Arc::clone(&room_holder);

            accept_hdr_async(socket, move |req: &Request, resp: Response| {
                if req.uri().path() != ws_path {
                    tracing::debug!(path = req.uri().path(), "Upgrade rejected: unknown path");
                    return Err(reject(StatusCode::NOT_FOUND));
                }

                let room = req.uri().query().and_then(|q| query_param(q, &room_param));
                if let Ok(mut guard) = holder.lock() {
                    *guard = room;
                }

                Ok(resp)
            })
            .await?
        };

        // Absent or empty room parameter selects the implicit shared room.
        let room = room_holder
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
            .filter(|room| !room.is_empty())
            .unwrap_or_else(|| self.config.default_room.clone());
        let room = RoomKey::new(room)?;

        let (sender, mut outbound) = PeerSender::channel(self.config.outbound_queue);
        let (mut sink, mut stream) = ws.split();

        let writer = tokio::spawn(async move {
            while let Some(frame) = outbound.recv().await {
                if sink.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let id = self.registry.register(sender.clone(), room.clone()).await;
        let ctx = PeerContext::new(id, peer_addr, room.clone());

        if !self.handler.on_connection(&ctx).await {
            tracing::info!(session_id = id, peer = %peer_addr, "Connection rejected by handler");
            self.registry.unregister(id).await;
            drop(sender);
            let _ = writer.await;
            return Ok(());
        }

        self.stats.record_connected();
        let mut session = PeerSession::new(id, peer_addr, room.clone());

        self.rooms.join(&room, id, sender.clone()).await;
        session.join();
        self.handler.on_join(&ctx).await;

        let router = MessageRouter::new(Arc::clone(&self.rooms), Arc::clone(&self.stats));

        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    session.record_frame();
                    if let Some(msg) = router.prepare(id, &text) {
                        if self.handler.on_message(&ctx, &msg).await {
                            router.dispatch(&room, id, &msg).await;
                        }
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(session_id = id, "Non-text frame dropped");
                    self.stats.record_malformed();
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {} // Ping/pong are answered by the protocol layer
                Err(e) => {
                    tracing::debug!(session_id = id, error = %e, "Read failed");
                    break;
                }
            }
        }

        session.close();

        let lifecycle = LifecycleManager::new(
            Arc::clone(&self.rooms),
            Arc::clone(&self.registry),
            Arc::clone(&self.stats),
        );
        lifecycle.on_disconnect(&room, id).await;
        self.stats.record_disconnected();
        self.handler.on_disconnect(&ctx).await;

        tracing::debug!(
            session_id = id,
            frames = session.frames_received,
            duration_ms = session.duration().as_millis() as u64,
            "Session ended"
        );

        drop(sender);
        writer.abort();

        Ok(())
    }
}

/// Build an HTTP error response for a failed upgrade
fn reject(status: StatusCode) -> ErrorResponse {
    let mut response = ErrorResponse::new(None);
    *response.status_mut() = status;
    response
}

/// Extract a query parameter without pulling in a URL crate
fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        if parts.next()? == name {
            Some(parts.next().unwrap_or("").to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param_extraction() {
        assert_eq!(query_param("room=r1", "room"), Some("r1".to_string()));
        assert_eq!(
            query_param("a=1&room=team%20x&b=2", "room"),
            Some("team%20x".to_string())
        );
        assert_eq!(query_param("a=1&b=2", "room"), None);
        assert_eq!(query_param("room=", "room"), Some(String::new()));
        assert_eq!(query_param("room", "room"), Some(String::new()));
    }

    #[test]
    fn test_reject_status() {
        let response = reject(StatusCode::NOT_FOUND);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.body().is_none());
    }
}

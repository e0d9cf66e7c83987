//! Signaling client implementation
//!
//! Provides client-side access to a relay for:
//! - Native peers that negotiate alongside browsers
//! - Integration tests and probes driving a live relay

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::{Error, Result};
use crate::protocol::SignalMessage;

/// Client connection to a signaling relay
///
/// # Example
/// ```no_run
/// use signal_relay::client::SignalClient;
/// use signal_relay::protocol::SignalMessage;
///
/// # async fn example() -> signal_relay::error::Result<()> {
/// let mut client = SignalClient::connect("ws://localhost:8080/websocket?room=demo").await?;
/// client.send(&SignalMessage::new("join")).await?;
///
/// while let Some(msg) = client.recv().await? {
///     println!("{:?} from {:?}", msg.kind, msg.id);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SignalClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl SignalClient {
    /// Connect to a relay URL, e.g. `ws://host:port/websocket?room=r1`
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws, _response) = connect_async(url).await?;
        tracing::debug!(url = url, "Connected to relay");

        Ok(Self { ws })
    }

    /// Send one signaling message
    pub async fn send(&mut self, msg: &SignalMessage) -> Result<()> {
        let text = msg.to_text()?;
        self.ws.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Receive the next signaling message.
    ///
    /// Skips transport-level frames (pings, pongs). Returns `Ok(None)`
    /// once the relay closes the connection.
    pub async fn recv(&mut self) -> Result<Option<SignalMessage>> {
        while let Some(frame) = self.ws.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    let msg = SignalMessage::parse(&text).map_err(Error::Json)?;
                    return Ok(Some(msg));
                }
                Ok(Message::Close(_)) => return Ok(None),
                Ok(_) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(None)
    }

    /// Close the connection
    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}

//! Reads binary caller audio off Asterisk's external-media channel (spec.md
//! §6: "binary audio frames over an external-media channel"). Mirrors
//! [`crate::events::AriEventReader`]'s websocket-reader shape, but yields
//! raw frame bytes instead of translated JSON events.

use bytes::Bytes;
use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::warn;

use crate::error::AriError;

/// Reads one channel's external-media audio socket, 8kHz mu-law frames.
pub struct ExternalMediaReader {
    socket: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl ExternalMediaReader {
    pub async fn connect(ws_url: &str) -> Result<Self, AriError> {
        let (socket, _response) = connect_async(ws_url)
            .await
            .map_err(|e| AriError::WebSocket(e.to_string()))?;
        Ok(Self { socket })
    }

    /// Returns the next inbound audio frame, or `None` once the channel's
    /// external-media socket closes.
    pub async fn next_frame(&mut self) -> Option<Bytes> {
        loop {
            let message = self.socket.next().await?;
            match message {
                Ok(Message::Binary(data)) => return Some(Bytes::from(data)),
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(err) => {
                    warn!(%err, "external-media websocket read error");
                    return None;
                }
            }
        }
    }
}

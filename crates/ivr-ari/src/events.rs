//! Translates raw ARI/Stasis websocket events into the closed
//! [`ivr_core::AriEvent`] set the orchestrator consumes.

use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use ivr_core::AriEvent;

use crate::error::AriError;

/// Reads the ARI events websocket for one Stasis application and yields
/// translated events. One reader is shared by every channel in the
/// application; callers filter by `channel_id` before forwarding into a
/// particular call's message queue.
pub struct AriEventReader {
    socket: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl AriEventReader {
    pub async fn connect(ws_url: &str) -> Result<Self, AriError> {
        let (socket, _response) = connect_async(ws_url)
            .await
            .map_err(|e| AriError::WebSocket(e.to_string()))?;
        Ok(Self { socket })
    }

    /// Returns the next `(channel_id, event)` pair, skipping event types
    /// outside the closed set this bridge reacts to.
    pub async fn next_event(&mut self) -> Option<(String, AriEvent)> {
        loop {
            let message = self.socket.next().await?;
            let message = match message {
                Ok(m) => m,
                Err(err) => {
                    warn!(%err, "ARI websocket read error");
                    return None;
                }
            };
            let Message::Text(text) = message else {
                continue;
            };
            let Ok(raw) = serde_json::from_str::<serde_json::Value>(&text) else {
                debug!("dropping unparseable ARI event frame");
                continue;
            };
            if let Some((channel_id, event)) = translate(&raw) {
                return Some((channel_id, event));
            }
        }
    }
}

fn channel_id_of(raw: &serde_json::Value) -> Option<String> {
    raw.get("channel")
        .and_then(|c| c.get("id"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
}

fn translate(raw: &serde_json::Value) -> Option<(String, AriEvent)> {
    let event_type = raw.get("type").and_then(serde_json::Value::as_str)?;
    match event_type {
        "StasisStart" => Some((channel_id_of(raw)?, AriEvent::StasisStart)),
        "StasisEnd" => Some((channel_id_of(raw)?, AriEvent::StasisEnd)),
        "ChannelHangupRequest" => Some((channel_id_of(raw)?, AriEvent::ChannelHangupRequest)),
        "ChannelDtmfReceived" => {
            let digit = raw
                .get("digit")
                .and_then(serde_json::Value::as_str)
                .and_then(|d| d.chars().next())?;
            Some((channel_id_of(raw)?, AriEvent::ChannelDtmfReceived { digit }))
        }
        "PlaybackStarted" => {
            let playback_id = raw
                .get("playback")
                .and_then(|p| p.get("id"))
                .and_then(serde_json::Value::as_str)?
                .to_owned();
            Some((
                channel_id_of(raw)?,
                AriEvent::PlaybackStarted { playback_id },
            ))
        }
        "PlaybackFinished" => {
            let playback_id = raw
                .get("playback")
                .and_then(|p| p.get("id"))
                .and_then(serde_json::Value::as_str)?
                .to_owned();
            Some((
                channel_id_of(raw)?,
                AriEvent::PlaybackFinished { playback_id },
            ))
        }
        "PlaybackFailed" => {
            let playback_id = raw
                .get("playback")
                .and_then(|p| p.get("id"))
                .and_then(serde_json::Value::as_str)?
                .to_owned();
            Some((channel_id_of(raw)?, AriEvent::PlaybackFailed { playback_id }))
        }
        "ChannelTalkingStarted" => {
            Some((channel_id_of(raw)?, AriEvent::ChannelTalkingStarted))
        }
        "ChannelTalkingFinished" => {
            let duration_ms = raw
                .get("duration")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0);
            Some((
                channel_id_of(raw)?,
                AriEvent::ChannelTalkingFinished { duration_ms },
            ))
        }
        _ => None,
    }
}

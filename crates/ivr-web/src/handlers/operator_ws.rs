//! Operator control-plane WebSocket — `GET /ws`.
//!
//! Ingest reads client JSON control messages and dispatches them to the
//! addressed call through the registry; direct replies (a requested
//! configuration, a conversation history snapshot, an unknown-call error)
//! are pushed back on `direct_tx`. Egress interleaves that direct-reply
//! channel with this connection's broadcast subscription so the console
//! also sees every orchestrator-emitted event, not just its own replies.
//! `tokio::select!` on the two spawned tasks mirrors the teacher's
//! ingest/egress split: whichever finishes first (client disconnect,
//! broadcast channel closed) aborts the other.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use ivr_core::{CallId, OperatorEvent};
use ivr_orchestrator::CallMessage;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClientMessage {
    #[serde(rename = "get_call_configuration")]
    GetCallConfiguration { call_id: CallId },
    #[serde(rename = "get_conversation_history")]
    GetConversationHistory { call_id: CallId },
    #[serde(rename = "session.update")]
    SessionUpdate {
        call_id: CallId,
        session: serde_json::Value,
    },
}

pub async fn operator_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_operator_ws(socket, state))
}

async fn handle_operator_ws(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut broadcast_rx = state.broadcaster.subscribe();
    let (direct_tx, mut direct_rx) = mpsc::unbounded_channel::<OperatorEvent>();

    let _ = direct_tx.send(OperatorEvent::ActiveCallsList {
        calls: state.registry.snapshot(),
    });

    let ingest_state = state.clone();
    let mut ingest = tokio::spawn(async move {
        while let Some(frame) = ws_receiver.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    handle_client_message(&text, &ingest_state, &direct_tx).await;
                }
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    let mut egress = tokio::spawn(async move {
        loop {
            tokio::select! {
                event = broadcast_rx.recv() => {
                    match event {
                        Ok(event) => {
                            if send_event(&mut ws_sender, &event).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "operator console fell behind the event broadcast");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
                event = direct_rx.recv() => {
                    match event {
                        Some(event) => {
                            if send_event(&mut ws_sender, &event).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = &mut ingest => { egress.abort(); }
        _ = &mut egress => { ingest.abort(); }
    }

    debug!("operator console disconnected");
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &OperatorEvent,
) -> Result<(), ()> {
    let Ok(json) = serde_json::to_string(event) else {
        return Ok(());
    };
    sender.send(Message::Text(json)).await.map_err(|_| ())
}

async fn handle_client_message(
    text: &str,
    state: &AppState,
    direct_tx: &mpsc::UnboundedSender<OperatorEvent>,
) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(err) => {
            let _ = direct_tx.send(OperatorEvent::Error {
                call_id: None,
                message: format!("malformed control message: {err}"),
            });
            return;
        }
    };

    match message {
        ClientMessage::GetCallConfiguration { call_id } => {
            let Some(tx) = state.registry.get(&call_id) else {
                let _ = direct_tx.send(unknown_call(call_id));
                return;
            };
            let (reply_tx, reply_rx) = oneshot::channel();
            if tx
                .send(CallMessage::OperatorGetConfig { reply: reply_tx })
                .is_err()
            {
                let _ = direct_tx.send(unknown_call(call_id));
                return;
            }
            if let Ok(config) = reply_rx.await {
                let _ = direct_tx.send(OperatorEvent::CallConfiguration { call_id, config });
            }
        }
        ClientMessage::GetConversationHistory { call_id } => {
            let Some(tx) = state.registry.get(&call_id) else {
                let _ = direct_tx.send(unknown_call(call_id));
                return;
            };
            let (reply_tx, reply_rx) = oneshot::channel();
            if tx
                .send(CallMessage::OperatorGetHistory { reply: reply_tx })
                .is_err()
            {
                let _ = direct_tx.send(unknown_call(call_id));
                return;
            }
            if let Ok(turns) = reply_rx.await {
                let _ = direct_tx.send(OperatorEvent::ConversationHistory { call_id, turns });
            }
        }
        ClientMessage::SessionUpdate { call_id, session } => {
            let Some(tx) = state.registry.get(&call_id) else {
                let _ = direct_tx.send(unknown_call(call_id));
                return;
            };
            // config_update_ack (or an error) is emitted by the orchestrator
            // itself, via the shared broadcaster, once the patch is applied.
            let _ = tx.send(CallMessage::OperatorSessionUpdate(session));
        }
    }
}

fn unknown_call(call_id: CallId) -> OperatorEvent {
    OperatorEvent::Error {
        call_id: Some(call_id.clone()),
        message: format!("no active call: {call_id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_get_call_configuration() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"get_call_configuration","call_id":"c1"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::GetCallConfiguration { call_id } if call_id == "c1"));
    }

    #[test]
    fn parses_session_update() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"session.update","call_id":"c1","session":{"speechEndSilenceTimeoutSeconds":3.0}}"#,
        )
        .unwrap();
        assert!(matches!(msg, ClientMessage::SessionUpdate { call_id, .. } if call_id == "c1"));
    }

    #[test]
    fn unknown_call_error_carries_call_id() {
        let event = unknown_call("ghost".to_string());
        match event {
            OperatorEvent::Error { call_id, .. } => assert_eq!(call_id.as_deref(), Some("ghost")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}

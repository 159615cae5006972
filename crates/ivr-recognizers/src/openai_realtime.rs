//! OpenAI Realtime transcription-session adapter (spec.md §4.6). A
//! `RealtimeTranscriptionSession` is configured with server-side VAD so the
//! adapter never has to run its own turn detection; it only surfaces the
//! transcription-shaped subset of the server event stream.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::connect_async;
use tracing::warn;

use async_openai::types::realtime::{
    AudioInput, AudioTranscription, RealtimeAudioFormats, RealtimeClientEvent,
    RealtimeClientEventInputAudioBufferAppend, RealtimeClientEventInputAudioBufferCommit,
    RealtimeClientEventSessionUpdate, RealtimeServerEvent, RealtimeTranscriptionSession,
    RealtimeTurnDetection, Session, TranscriptionAudio,
};

use ivr_core::{
    PortError, RecognizerConfig, RecognizerEvent, RecognizerSession, RecognizerSessionFactory,
    Transcript,
};

use crate::error::RecognizerAdapterError;

#[derive(Debug, Clone)]
pub struct OpenAiRealtimeConfig {
    /// Full websocket URL, e.g.
    /// `wss://api.openai.com/v1/realtime?intent=transcription`.
    pub ws_url: String,
    pub api_key: String,
}

pub struct OpenAiRealtimeFactory {
    config: OpenAiRealtimeConfig,
}

impl OpenAiRealtimeFactory {
    #[must_use]
    pub fn new(config: OpenAiRealtimeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RecognizerSessionFactory for OpenAiRealtimeFactory {
    async fn open(
        &self,
        config: RecognizerConfig,
    ) -> Result<
        (
            Box<dyn RecognizerSession>,
            mpsc::UnboundedReceiver<RecognizerEvent>,
        ),
        PortError,
    > {
        let mut request = self
            .config
            .ws_url
            .clone()
            .into_client_request()
            .map_err(|e| RecognizerAdapterError::WebSocket(e.to_string()))?;
        request.headers_mut().insert(
            "Authorization",
            format!("Bearer {}", self.config.api_key)
                .parse()
                .map_err(|_| RecognizerAdapterError::WebSocket("malformed api key".to_string()))?,
        );
        request
            .headers_mut()
            .insert("OpenAI-Beta", "realtime=v1".parse().unwrap());

        let (ws_stream, _response) = connect_async(request)
            .await
            .map_err(|e| RecognizerAdapterError::WebSocket(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let session_update = RealtimeClientEvent::SessionUpdate(RealtimeClientEventSessionUpdate {
            event_id: None,
            session: Session::RealtimeTranscriptionSession(build_transcription_session(&config)),
        });
        write
            .send(Message::from(session_update))
            .await
            .map_err(|e| RecognizerAdapterError::WebSocket(e.to_string()))?;

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(32);
        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if write.send(message).await.is_err() {
                    break;
                }
            }
        });

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if let Some(event) = translate_server_event(&text) {
                            if event_tx.send(event).is_err() {
                                return;
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        let _ = event_tx.send(RecognizerEvent::Closed { reason: None });
                        return;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(%err, "openai realtime websocket error");
                        let _ = event_tx.send(RecognizerEvent::Error {
                            fatal: true,
                            message: err.to_string(),
                        });
                        return;
                    }
                }
            }
            let _ = event_tx.send(RecognizerEvent::Closed { reason: None });
        });

        Ok((Box::new(OpenAiRealtimeSession { outbound_tx }), event_rx))
    }
}

struct OpenAiRealtimeSession {
    outbound_tx: mpsc::Sender<Message>,
}

#[async_trait]
impl RecognizerSession for OpenAiRealtimeSession {
    async fn send_audio(&mut self, frame: &[u8]) -> Result<(), PortError> {
        let event = RealtimeClientEventInputAudioBufferAppend {
            event_id: None,
            audio: BASE64.encode(frame),
        };
        self.outbound_tx
            .send(Message::from(event))
            .await
            .map_err(|_| PortError::RecognizerTransient("websocket writer gone".to_string()))
    }

    async fn half_close(&mut self) -> Result<(), PortError> {
        let event = RealtimeClientEventInputAudioBufferCommit { event_id: None };
        self.outbound_tx
            .send(Message::from(event))
            .await
            .map_err(|_| PortError::RecognizerTransient("websocket writer gone".to_string()))
    }

    async fn close(&mut self, _reason: &str) -> Result<(), PortError> {
        let _ = self.outbound_tx.send(Message::Close(None)).await;
        Ok(())
    }
}

fn build_transcription_session(config: &RecognizerConfig) -> RealtimeTranscriptionSession {
    RealtimeTranscriptionSession {
        audio: TranscriptionAudio {
            input: AudioInput {
                format: RealtimeAudioFormats::PCMUAudioFormat,
                noise_reduction: None,
                transcription: Some(AudioTranscription {
                    language: Some(config.language_code.clone()),
                    model: Some("gpt-4o-transcribe".to_string()),
                    prompt: None,
                }),
                turn_detection: RealtimeTurnDetection::ServerVAD {
                    create_response: Some(false),
                    idle_timeout_ms: None,
                    interrupt_response: Some(false),
                    prefix_padding_ms: 300,
                    silence_duration_ms: (config.voice_activity_timeout.speech_end_timeout_seconds
                        * 1000.0) as u32,
                    threshold: 0.5,
                },
            },
        },
        include: None,
    }
}

fn translate_server_event(text: &str) -> Option<RecognizerEvent> {
    let event: RealtimeServerEvent = serde_json::from_str(text).ok()?;
    match event {
        RealtimeServerEvent::InputAudioBufferSpeechStarted(_) => Some(RecognizerEvent::ActivityBegin),
        RealtimeServerEvent::InputAudioBufferSpeechStopped(_) => Some(RecognizerEvent::ActivityEnd),
        RealtimeServerEvent::ConversationItemInputAudioTranscriptionDelta(e) => {
            Some(RecognizerEvent::Transcript(Transcript::interim(e.delta)))
        }
        RealtimeServerEvent::ConversationItemInputAudioTranscriptionCompleted(e) => {
            Some(RecognizerEvent::Transcript(Transcript {
                text: e.transcript,
                is_final: true,
                confidence: None,
                language_code: None,
            }))
        }
        RealtimeServerEvent::ConversationItemInputAudioTranscriptionFailed(e) => {
            Some(RecognizerEvent::Error {
                fatal: false,
                message: e.error.message,
            })
        }
        RealtimeServerEvent::Error(e) => Some(RecognizerEvent::Error {
            fatal: true,
            message: e.error.message,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcription_session_carries_language_code() {
        let config = RecognizerConfig {
            language_code: "fr-FR".to_string(),
            ..RecognizerConfig::default()
        };
        let session = build_transcription_session(&config);
        assert_eq!(
            session.audio.input.transcription.unwrap().language,
            Some("fr-FR".to_string())
        );
    }

    #[test]
    fn speech_started_translates_to_activity_begin() {
        let raw = serde_json::json!({
            "type": "input_audio_buffer.speech_started",
            "event_id": "evt_1",
            "item_id": "item_1",
            "audio_start_ms": 0
        })
        .to_string();
        let event = translate_server_event(&raw);
        assert!(matches!(event, Some(RecognizerEvent::ActivityBegin)));
    }

    #[test]
    fn unrecognized_event_type_translates_to_none() {
        let raw = serde_json::json!({ "type": "response.created" }).to_string();
        // Missing required response fields: still exercises the ok()? short-circuit.
        assert!(translate_server_event(&raw).is_none());
    }
}

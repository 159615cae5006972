//! Google Cloud Speech-to-Text v1 streaming recognizer adapter (spec.md §4.6,
//! §6). One `StreamingRecognize` gRPC call per `RecognizerSession`; the
//! config-side fields of the streaming config mirror `RecognizerConfig`
//! one-to-one.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::metadata::MetadataValue;
use tonic::transport::Channel;
use tonic::Request;
use tracing::{debug, warn};

use ivr_core::{
    PortError, RecognizerConfig, RecognizerEvent, RecognizerSession, RecognizerSessionFactory,
    Transcript,
};

use crate::error::RecognizerAdapterError;
use crate::proto::speech::speech_client::SpeechClient;
use crate::proto::speech::streaming_recognize_request::StreamingRequest;
use crate::proto::speech::{
    Duration as ProtoDuration, RecognitionConfig as ProtoRecognitionConfig, SpeechEventType,
    StreamingRecognitionConfig, StreamingRecognizeRequest, StreamingRecognizeResponse,
    VoiceActivityTimeout as ProtoVoiceActivityTimeout,
};

/// Connection details for the Google Speech gRPC endpoint. `api_key` is sent
/// as an `x-goog-api-key` metadata value on every call rather than baked into
/// a service-account credential flow — adequate for a bridge that already
/// terminates one call's worth of trust at the ARI boundary.
#[derive(Debug, Clone)]
pub struct GoogleSpeechConfig {
    pub endpoint: String,
    pub api_key: String,
}

pub struct GoogleSpeechFactory {
    config: GoogleSpeechConfig,
}

impl GoogleSpeechFactory {
    #[must_use]
    pub fn new(config: GoogleSpeechConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RecognizerSessionFactory for GoogleSpeechFactory {
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
        let channel = Channel::from_shared(self.config.endpoint.clone())
            .map_err(|e| RecognizerAdapterError::Connect(e.to_string()))?
            .connect()
            .await
            .map_err(|e| RecognizerAdapterError::Connect(e.to_string()))?;

        let api_key = self.config.api_key.clone();
        let mut client = SpeechClient::with_interceptor(channel, move |mut req: Request<()>| {
            let value: MetadataValue<_> = api_key
                .parse()
                .map_err(|_| tonic::Status::invalid_argument("malformed api key"))?;
            req.metadata_mut().insert("x-goog-api-key", value);
            Ok(req)
        });

        let (audio_tx, audio_rx) = mpsc::channel::<StreamingRecognizeRequest>(32);
        let initial = StreamingRecognizeRequest {
            streaming_request: Some(StreamingRequest::StreamingConfig(build_streaming_config(
                &config,
            ))),
        };
        audio_tx
            .send(initial)
            .await
            .map_err(|_| RecognizerAdapterError::Connect("audio channel closed immediately".into()))?;

        let response = client
            .streaming_recognize(Request::new(ReceiverStream::new(audio_rx)))
            .await
            .map_err(RecognizerAdapterError::Stream)?;
        let mut inbound = response.into_inner();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            loop {
                match inbound.message().await {
                    Ok(Some(response)) => {
                        for event in translate_response(response) {
                            if event_tx.send(event).is_err() {
                                return;
                            }
                        }
                    }
                    Ok(None) => {
                        let _ = event_tx.send(RecognizerEvent::Closed { reason: None });
                        return;
                    }
                    Err(status) => {
                        warn!(%status, "google speech stream error");
                        let fatal = !matches!(
                            status.code(),
                            tonic::Code::Unavailable | tonic::Code::DeadlineExceeded
                        );
                        let _ = event_tx.send(RecognizerEvent::Error {
                            fatal,
                            message: status.message().to_string(),
                        });
                        return;
                    }
                }
            }
        });

        Ok((
            Box::new(GoogleSpeechSession {
                audio_tx: Some(audio_tx),
            }),
            event_rx,
        ))
    }
}

struct GoogleSpeechSession {
    audio_tx: Option<mpsc::Sender<StreamingRecognizeRequest>>,
}

#[async_trait]
impl RecognizerSession for GoogleSpeechSession {
    async fn send_audio(&mut self, frame: &[u8]) -> Result<(), PortError> {
        let Some(tx) = &self.audio_tx else {
            return Err(PortError::RecognizerFatal("session already closed".to_string()));
        };
        tx.send(StreamingRecognizeRequest {
            streaming_request: Some(StreamingRequest::AudioContent(frame.to_vec())),
        })
        .await
        .map_err(|_| PortError::RecognizerTransient("audio channel closed".to_string()))
    }

    async fn half_close(&mut self) -> Result<(), PortError> {
        // Dropping the sender ends the outbound stream; Google still emits a
        // final result afterwards if one is pending.
        self.audio_tx.take();
        Ok(())
    }

    async fn close(&mut self, reason: &str) -> Result<(), PortError> {
        debug!(reason, "closing google speech session");
        self.audio_tx.take();
        Ok(())
    }
}

fn to_proto_duration(seconds: f64) -> ProtoDuration {
    ProtoDuration {
        seconds: seconds.trunc() as i64,
        nanos: (seconds.fract() * 1_000_000_000.0).round() as i32,
    }
}

fn build_streaming_config(config: &RecognizerConfig) -> StreamingRecognitionConfig {
    StreamingRecognitionConfig {
        config: Some(ProtoRecognitionConfig {
            encoding: config.encoding.clone(),
            sample_rate_hertz: config.sample_rate_hertz as i32,
            language_code: config.language_code.clone(),
            model: config.model.clone(),
            use_enhanced: config.use_enhanced,
            enable_automatic_punctuation: config.enable_automatic_punctuation,
            enable_word_time_offsets: config.enable_word_time_offsets,
            enable_speaker_diarization: config.enable_speaker_diarization,
        }),
        single_utterance: config.single_utterance,
        interim_results: config.interim_results,
        voice_activity_timeout: Some(ProtoVoiceActivityTimeout {
            speech_start_timeout: Some(to_proto_duration(
                config.voice_activity_timeout.speech_start_timeout_seconds,
            )),
            speech_end_timeout: Some(to_proto_duration(
                config.voice_activity_timeout.speech_end_timeout_seconds,
            )),
        }),
        enable_voice_activity_events: config.enable_voice_activity_events,
    }
}

fn translate_response(response: StreamingRecognizeResponse) -> Vec<RecognizerEvent> {
    let mut events = Vec::new();
    match response.speech_event_type() {
        SpeechEventType::SpeechActivityBegin => events.push(RecognizerEvent::ActivityBegin),
        SpeechEventType::SpeechActivityEnd => events.push(RecognizerEvent::ActivityEnd),
        SpeechEventType::SpeechEventUnspecified => {}
    }
    for result in response.results {
        let Some(alternative) = result.alternatives.into_iter().next() else {
            continue;
        };
        events.push(RecognizerEvent::Transcript(Transcript {
            text: alternative.transcript,
            is_final: result.is_final,
            confidence: Some(alternative.confidence),
            language_code: (!result.language_code.is_empty()).then_some(result.language_code),
        }));
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_split_into_whole_and_fractional_nanos() {
        let d = to_proto_duration(1.5);
        assert_eq!(d.seconds, 1);
        assert_eq!(d.nanos, 500_000_000);
    }

    #[test]
    fn streaming_config_carries_recognizer_config_fields() {
        let config = RecognizerConfig {
            language_code: "es-MX".to_string(),
            ..RecognizerConfig::default()
        };
        let streaming = build_streaming_config(&config);
        assert_eq!(
            streaming.config.as_ref().unwrap().language_code,
            "es-MX"
        );
        assert_eq!(streaming.interim_results, config.interim_results);
    }

    #[test]
    fn activity_begin_event_translates_with_no_results() {
        let response = StreamingRecognizeResponse {
            results: vec![],
            speech_event_type: SpeechEventType::SpeechActivityBegin as i32,
        };
        let events = translate_response(response);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RecognizerEvent::ActivityBegin));
    }
}

//! End-to-end scenarios for one call, driven entirely through fake ports
//! and a paused clock so timer behavior is deterministic and instant.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use ivr_core::{
    ActivationMode, AppEventEmitter, AriEvent, BatchFallback, Call, CallConfig, OperatorEvent,
    PortError, RecognizerConfig, RecognizerEvent, RecognizerSession, RecognizerSessionFactory,
    TelephonyActions, Transcript, VadMode,
};
use ivr_orchestrator::{CallMessage, CallOrchestrator};

struct FakeActions {
    played: Arc<AtomicUsize>,
}

#[async_trait]
impl TelephonyActions for FakeActions {
    async fn answer(&self) -> Result<(), PortError> {
        Ok(())
    }
    async fn play_media(&self, _media_uri: &str) -> Result<String, PortError> {
        self.played.fetch_add(1, Ordering::SeqCst);
        Ok("pb-1".to_string())
    }
    async fn stop_playback(&self, _playback_id: &str) -> Result<(), PortError> {
        Ok(())
    }
    async fn set_channel_var(&self, _name: &str, _value: &str) -> Result<(), PortError> {
        Ok(())
    }
    async fn hangup(&self) -> Result<(), PortError> {
        Ok(())
    }
}

struct NoopSession;

#[async_trait]
impl RecognizerSession for NoopSession {
    async fn send_audio(&mut self, _frame: &[u8]) -> Result<(), PortError> {
        Ok(())
    }
    async fn half_close(&mut self) -> Result<(), PortError> {
        Ok(())
    }
    async fn close(&mut self, _reason: &str) -> Result<(), PortError> {
        Ok(())
    }
}

/// Opens a session whose event stream never produces anything on its own;
/// the test drives recognizer behavior by sending `CallMessage::Recognizer`
/// directly instead.
struct SilentRecognizerFactory;

#[async_trait]
impl RecognizerSessionFactory for SilentRecognizerFactory {
    async fn open(
        &self,
        _config: RecognizerConfig,
    ) -> Result<
        (
            Box<dyn RecognizerSession>,
            mpsc::UnboundedReceiver<RecognizerEvent>,
        ),
        PortError,
    > {
        let (tx, rx) = mpsc::unbounded_channel();
        std::mem::forget(tx);
        Ok((Box::new(NoopSession), rx))
    }
}

struct EmptyBatchFallback;

#[async_trait]
impl BatchFallback for EmptyBatchFallback {
    async fn transcribe(&self, _audio: &[u8], _language_code: &str) -> String {
        String::new()
    }
}

#[derive(Clone, Default)]
struct RecordingEmitter {
    events: Arc<Mutex<Vec<OperatorEvent>>>,
}

impl RecordingEmitter {
    fn saw(&self, name: &str) -> bool {
        self.events
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.event_name() == name)
    }
}

impl AppEventEmitter for RecordingEmitter {
    fn emit(&self, event: OperatorEvent) {
        self.events.lock().unwrap().push(event);
    }
    fn clone_box(&self) -> Box<dyn AppEventEmitter> {
        Box::new(self.clone())
    }
}

fn spawn_call(config: CallConfig) -> (mpsc::UnboundedSender<CallMessage>, RecordingEmitter, tokio::task::JoinHandle<ivr_core::CallOutcome>) {
    let call = Call::new("call-1".to_string(), None, config);
    let emitter = RecordingEmitter::default();
    let (orchestrator, tx) = CallOrchestrator::new(
        call,
        Box::new(FakeActions {
            played: Arc::new(AtomicUsize::new(0)),
        }),
        Arc::new(SilentRecognizerFactory),
        Arc::new(EmptyBatchFallback),
        Arc::new(emitter.clone()),
    );
    let handle = tokio::spawn(orchestrator.run());
    (tx, emitter, handle)
}

#[tokio::test(start_paused = true)]
async fn immediate_activation_streams_and_final_transcript_closes_the_call() {
    let config = CallConfig {
        activation_mode: ActivationMode::Immediate,
        ..CallConfig::default()
    };
    let (tx, emitter, handle) = spawn_call(config);

    tx.send(CallMessage::Ari(AriEvent::StasisStart)).unwrap();
    tokio::task::yield_now().await;
    assert!(emitter.saw("call_answered"));

    tx.send(CallMessage::Recognizer(RecognizerEvent::Transcript(
        Transcript {
            text: "hello world".to_string(),
            is_final: true,
            confidence: Some(0.9),
            language_code: None,
        },
    )))
    .unwrap();

    let outcome = handle.await.unwrap();
    assert_eq!(outcome.final_transcript.as_deref(), Some("hello world"));
    assert_eq!(
        outcome.cleanup_reason.as_deref(),
        Some("final_transcript_received")
    );
}

#[tokio::test(start_paused = true)]
async fn no_speech_begin_timeout_closes_the_call() {
    let config = CallConfig {
        activation_mode: ActivationMode::Immediate,
        no_speech_begin_timeout_seconds: 5.0,
        initial_stream_idle_timeout_seconds: 60.0,
        max_recognition_duration_seconds: 60.0,
        dtmf_final_timeout_seconds: 60.0,
        ..CallConfig::default()
    };
    let (tx, _emitter, handle) = spawn_call(config);

    tx.send(CallMessage::Ari(AriEvent::StasisStart)).unwrap();
    tokio::time::advance(Duration::from_secs(6)).await;

    let outcome = handle.await.unwrap();
    assert!(outcome.no_speech_begin_timeout);
    assert_eq!(
        outcome.cleanup_reason.as_deref(),
        Some("app_no_speech_begin_timeout")
    );
}

#[tokio::test(start_paused = true)]
async fn dtmf_digits_finalize_purely_on_the_final_timer() {
    let config = CallConfig {
        activation_mode: ActivationMode::Immediate,
        dtmf_enabled: true,
        dtmf_inter_digit_timeout_seconds: 3.0,
        dtmf_final_timeout_seconds: 5.0,
        ..CallConfig::default()
    };
    let (tx, emitter, handle) = spawn_call(config);

    tx.send(CallMessage::Ari(AriEvent::StasisStart)).unwrap();
    tokio::task::yield_now().await;

    for digit in ['1', '2', '3'] {
        tx.send(CallMessage::Ari(AriEvent::ChannelDtmfReceived { digit }))
            .unwrap();
        tokio::task::yield_now().await;
    }

    // No terminator digit exists in this model: the collector is still
    // open and would accept more digits until `dtmfFinal` expires.
    assert!(!emitter.saw("dtmf_input_finalized"));

    tokio::time::advance(Duration::from_secs(5)).await;

    let outcome = handle.await.unwrap();
    assert_eq!(outcome.dtmf_digits.as_deref(), Some("123"));
    assert_eq!(outcome.cleanup_reason.as_deref(), Some("dtmf_final_timeout"));
    assert!(emitter.saw("dtmf_mode_activated"));
    assert!(emitter.saw("dtmf_input_finalized"));
}

#[tokio::test(start_paused = true)]
async fn dtmf_final_timeout_with_no_digits_closes_the_call() {
    let config = CallConfig {
        activation_mode: ActivationMode::Immediate,
        dtmf_enabled: true,
        dtmf_final_timeout_seconds: 5.0,
        no_speech_begin_timeout_seconds: 60.0,
        initial_stream_idle_timeout_seconds: 60.0,
        max_recognition_duration_seconds: 60.0,
        ..CallConfig::default()
    };
    let (tx, _emitter, handle) = spawn_call(config);

    tx.send(CallMessage::Ari(AriEvent::StasisStart)).unwrap();
    tokio::time::advance(Duration::from_secs(6)).await;

    let outcome = handle.await.unwrap();
    assert_eq!(outcome.cleanup_reason.as_deref(), Some("dtmf_final_timeout"));
}

#[tokio::test(start_paused = true)]
async fn dtmf_inter_digit_expiry_is_a_no_op_and_the_final_timer_still_governs() {
    let config = CallConfig {
        activation_mode: ActivationMode::Immediate,
        dtmf_enabled: true,
        dtmf_inter_digit_timeout_seconds: 3.0,
        dtmf_final_timeout_seconds: 10.0,
        no_speech_begin_timeout_seconds: 60.0,
        ..CallConfig::default()
    };
    let (tx, emitter, handle) = spawn_call(config);

    tx.send(CallMessage::Ari(AriEvent::StasisStart)).unwrap();
    tokio::task::yield_now().await;
    tx.send(CallMessage::Ari(AriEvent::ChannelDtmfReceived { digit: '1' }))
        .unwrap();
    tokio::task::yield_now().await;

    // The inter-digit timer expires well before the final timer; collection
    // must still be open afterwards.
    tokio::time::advance(Duration::from_secs(4)).await;
    assert!(!emitter.saw("dtmf_input_finalized"));

    tx.send(CallMessage::Ari(AriEvent::ChannelDtmfReceived { digit: '2' }))
        .unwrap();
    tokio::task::yield_now().await;

    tokio::time::advance(Duration::from_secs(10)).await;

    let outcome = handle.await.unwrap();
    assert_eq!(outcome.dtmf_digits.as_deref(), Some("12"));
    assert_eq!(outcome.cleanup_reason.as_deref(), Some("dtmf_final_timeout"));
}

#[tokio::test(start_paused = true)]
async fn operator_kill_closes_the_call_immediately() {
    let config = CallConfig::default();
    let (tx, _emitter, handle) = spawn_call(config);

    tx.send(CallMessage::Ari(AriEvent::StasisStart)).unwrap();
    tokio::task::yield_now().await;
    tx.send(CallMessage::OperatorKill).unwrap();

    let outcome = handle.await.unwrap();
    assert_eq!(outcome.cleanup_reason.as_deref(), Some("operator_kill"));
}

#[tokio::test(start_paused = true)]
async fn session_update_patches_only_named_fields() {
    let config = CallConfig::default();
    let (tx, _emitter, handle) = spawn_call(config);

    tx.send(CallMessage::Ari(AriEvent::StasisStart)).unwrap();
    tokio::task::yield_now().await;

    tx.send(CallMessage::OperatorSessionUpdate(serde_json::json!({
        "maxRecognitionDurationSeconds": 2.0
    })))
    .unwrap();
    tokio::task::yield_now().await;

    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
    tx.send(CallMessage::OperatorGetConfig { reply: reply_tx })
        .unwrap();
    let cfg = reply_rx.await.unwrap();
    assert!((cfg.max_recognition_duration_seconds - 2.0).abs() < f64::EPSILON);

    tx.send(CallMessage::OperatorKill).unwrap();
    let outcome = handle.await.unwrap();
    assert_eq!(outcome.cleanup_reason.as_deref(), Some("operator_kill"));
}

#[tokio::test(start_paused = true)]
async fn vad_activates_on_telephony_talk_detect_and_streams() {
    let config = CallConfig {
        activation_mode: ActivationMode::Vad,
        vad_mode: VadMode::VadMode,
        vad_initial_silence_delay_seconds: 0.4,
        vad_activation_delay_seconds: 0.2,
        vad_max_wait_after_prompt_seconds: 5.0,
        ..CallConfig::default()
    };
    let (tx, emitter, handle) = spawn_call(config);

    tx.send(CallMessage::Ari(AriEvent::StasisStart)).unwrap();
    tokio::task::yield_now().await;
    assert!(emitter.saw("vad_post_prompt_logic_started"));

    // Both VAD delay timers must expire before a talk-detect event is
    // allowed to activate streaming.
    tokio::time::advance(std::time::Duration::from_millis(500)).await;

    tx.send(CallMessage::Ari(AriEvent::ChannelTalkingStarted))
        .unwrap();
    tokio::task::yield_now().await;
    assert!(emitter.saw("vad_speech_detected_start"));
    assert!(emitter.saw("call_resources_initialized"));

    tx.send(CallMessage::Recognizer(RecognizerEvent::Transcript(
        Transcript {
            text: "one moment please".to_string(),
            is_final: true,
            confidence: Some(0.8),
            language_code: None,
        },
    )))
    .unwrap();

    let outcome = handle.await.unwrap();
    assert_eq!(
        outcome.final_transcript.as_deref(),
        Some("one moment please")
    );
}

#[tokio::test(start_paused = true)]
async fn vad_max_wait_after_prompt_times_out_without_opening_a_recognizer() {
    let config = CallConfig {
        activation_mode: ActivationMode::Vad,
        vad_mode: VadMode::VadMode,
        vad_initial_silence_delay_seconds: 0.2,
        vad_activation_delay_seconds: 0.2,
        vad_max_wait_after_prompt_seconds: 5.0,
        ..CallConfig::default()
    };
    let (tx, _emitter, handle) = spawn_call(config);

    tx.send(CallMessage::Ari(AriEvent::StasisStart)).unwrap();
    tokio::task::yield_now().await;

    // No prompt configured, so the delay timers are the only gate; once
    // they expire with no speech, `vadMaxWaitAfterPrompt` arms and then
    // fires with no recognizer ever having opened.
    tokio::time::advance(std::time::Duration::from_secs(6)).await;

    let outcome = handle.await.unwrap();
    assert_eq!(
        outcome.cleanup_reason.as_deref(),
        Some("vad_max_wait_after_prompt_timeout")
    );
    assert!(outcome.final_transcript.is_none());
}

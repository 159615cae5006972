//! Call Orchestrator — the per-call state machine (spec.md §4.8).
//!
//! One `CallOrchestrator` owns one call end to end. It is spawned onto its
//! own `tokio::task` and is the single writer of everything it owns: the
//! `Call` entity, the `TimerRegistry`, the `AudioFramePump`, the DTMF
//! Collector and the `PlaybackController`. The VAD Sensor Adapter
//! (`crate::vad`) has no state of its own to own — it is a pure function
//! translating ARI talk-detect events. Every other task — the ARI event
//! reader, the recognizer's event stream, the operator WebSocket handler —
//! only ever gets a clone of this call's `mpsc::UnboundedSender<CallMessage>`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use ivr_core::{
    Actor, ActivationMode, AppEventEmitter, AriEvent, BatchFallback, Call, CallConfig,
    CallOutcome, ConversationTurn, LifecycleState, OperatorEvent, RecognizerEvent,
    RecognizerSessionFactory, TelephonyActions, TerminalReason, TimerName, VadMode,
};

use crate::dtmf::{DtmfCollector, SpeechDisabledGate};
use crate::frame_pump::AudioFramePump;
use crate::message::CallMessage;
use crate::playback::PlaybackController;
use crate::timer::TimerRegistry;
use crate::vad::{self, VadTransition};

/// ~10 seconds of 8kHz mu-law audio, kept as a rolling tail for batch
/// fallback transcription.
const MAX_BUFFERED_AUDIO_BYTES: usize = 80_000;

const TALK_DETECT_VAR: &str = "TALK_DETECT";
const TALK_DETECT_REMOVE: &str = "remove";

pub struct CallOrchestrator {
    call: Call,
    rx: mpsc::UnboundedReceiver<CallMessage>,
    tx: mpsc::UnboundedSender<CallMessage>,

    timers: TimerRegistry,
    frame_pump: AudioFramePump,
    dtmf: DtmfCollector,
    playback: PlaybackController,

    recognizer_factory: Arc<dyn RecognizerSessionFactory>,
    batch_fallback: Arc<dyn BatchFallback>,
    emitter: Arc<dyn AppEventEmitter>,

    buffered_audio: Vec<u8>,
    outcome: CallOutcome,

    // VAD activation bookkeeping (activationMode = vad only).
    vad_sensor_armed: bool,
    vad_initial_silence_expired: bool,
    vad_activation_delay_expired: bool,
    prompt_ended: bool,
    speech_start_observed: bool,
}

fn d(seconds: f64) -> Duration {
    Duration::from_secs_f64(seconds.max(0.0))
}

fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis().max(0)).unwrap_or(0)
}

impl CallOrchestrator {
    #[must_use]
    pub fn new(
        call: Call,
        actions: Box<dyn TelephonyActions>,
        recognizer_factory: Arc<dyn RecognizerSessionFactory>,
        batch_fallback: Arc<dyn BatchFallback>,
        emitter: Arc<dyn AppEventEmitter>,
    ) -> (Self, mpsc::UnboundedSender<CallMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let timers = TimerRegistry::new(call.id.clone(), tx.clone());
        let gate = SpeechDisabledGate::new();
        let orchestrator = Self {
            call,
            rx,
            tx: tx.clone(),
            timers,
            frame_pump: AudioFramePump::new(),
            dtmf: DtmfCollector::new(gate),
            playback: PlaybackController::new(actions),
            recognizer_factory,
            batch_fallback,
            emitter,
            buffered_audio: Vec::new(),
            outcome: CallOutcome::default(),
            vad_sensor_armed: false,
            vad_initial_silence_expired: false,
            vad_activation_delay_expired: false,
            prompt_ended: false,
            speech_start_observed: false,
        };
        (orchestrator, tx)
    }

    fn config(&self) -> &CallConfig {
        &self.call.config
    }

    fn enter(&mut self, state: LifecycleState) {
        debug!(call_id = %self.call.id, from = ?self.call.state, to = ?state, "state transition");
        self.call.state = state;
        self.emitter.emit(OperatorEvent::AriCallStatusUpdate {
            call_id: self.call.id.clone(),
            state,
        });
    }

    /// Runs the call to completion and returns its final outcome.
    pub async fn run(mut self) -> CallOutcome {
        while let Some(msg) = self.rx.recv().await {
            if self.handle(msg).await {
                break;
            }
        }
        self.outcome.clone()
    }

    /// Handles one message. Returns `true` once the call has reached
    /// `Closed` and the loop should stop.
    async fn handle(&mut self, msg: CallMessage) -> bool {
        match msg {
            CallMessage::Ari(event) => self.handle_ari(event).await,
            CallMessage::AudioFrame(frame) => self.handle_audio_frame(&frame).await,
            CallMessage::RecognizerOpened(session) => {
                self.frame_pump.attach_recognizer(session);
                if !self.buffered_audio.is_empty() {
                    let buffered = std::mem::take(&mut self.buffered_audio);
                    let _ = self.frame_pump.pump(&buffered).await;
                }
                false
            }
            CallMessage::Recognizer(event) => self.handle_recognizer_event(event).await,
            CallMessage::TimerFired {
                timer, generation, ..
            } => self.handle_timer(timer, generation).await,
            CallMessage::OperatorSessionUpdate(patch) => {
                self.handle_session_update(patch);
                false
            }
            CallMessage::OperatorGetConfig { reply } => {
                let _ = reply.send(self.call.config.clone());
                false
            }
            CallMessage::OperatorGetHistory { reply } => {
                let _ = reply.send(self.call.history.snapshot());
                false
            }
            CallMessage::OperatorKill => {
                self.finalize(TerminalReason::OperatorKill).await;
                true
            }
        }
    }

    // -- ARI -----------------------------------------------------------

    async fn handle_ari(&mut self, event: AriEvent) -> bool {
        if let Some(transition) = vad::translate(&event) {
            if self.vad_sensor_armed {
                self.on_vad_transition(transition);
            }
            return false;
        }
        match event {
            AriEvent::StasisStart => self.handle_stasis_start().await,
            AriEvent::StasisEnd | AriEvent::ChannelHangupRequest => {
                self.finalize(TerminalReason::Hangup).await;
                true
            }
            AriEvent::ChannelDtmfReceived { digit } => self.handle_dtmf_digit(digit).await,
            AriEvent::PlaybackStarted { .. } => false,
            AriEvent::PlaybackFinished { playback_id } => {
                if self.playback.on_finished(&playback_id) {
                    self.on_prompt_finished().await;
                }
                false
            }
            AriEvent::PlaybackFailed { playback_id } => {
                if self.playback.on_finished(&playback_id) {
                    self.on_prompt_finished().await;
                }
                false
            }
            AriEvent::ChannelTalkingStarted | AriEvent::ChannelTalkingFinished { .. } => {
                unreachable!("handled by the vad::translate branch above")
            }
        }
    }

    async fn handle_stasis_start(&mut self) -> bool {
        if let Err(err) = self.playback.answer().await {
            warn!(call_id = %self.call.id, %err, "answer failed");
            self.finalize(TerminalReason::TelephonyFatal).await;
            return true;
        }
        self.enter(LifecycleState::Answered);
        self.emitter.emit(OperatorEvent::CallAnswered {
            call_id: self.call.id.clone(),
        });
        self.timers.arm(
            TimerName::MaxRecognition,
            d(self.config().max_recognition_duration_seconds),
        );
        if self.config().activation_mode == ActivationMode::Vad {
            self.enable_vad_sensor().await;
        }
        if let Some(uri) = self.config().prompt_media_uri.clone() {
            if let Err(err) = self.playback.play(&uri).await {
                warn!(call_id = %self.call.id, %err, "prompt playback failed to start");
                self.emitter.emit(OperatorEvent::PlaybackFailedToStart {
                    call_id: self.call.id.clone(),
                    reason: err.to_string(),
                });
            } else {
                self.emitter.emit(OperatorEvent::PlaybackStarted {
                    call_id: self.call.id.clone(),
                    media_uri: uri,
                });
            }
        }
        self.enter_pre_recognition();
        false
    }

    fn enter_pre_recognition(&mut self) {
        self.enter(LifecycleState::PreRecognition);
        self.timers.arm(
            TimerName::NoSpeechBegin,
            d(self.config().no_speech_begin_timeout_seconds),
        );
        self.begin_activation();
    }

    /// §4.8 activation policy table. Leaves `PreRecognition` and decides how
    /// `Activating` will progress to `Streaming`.
    fn begin_activation(&mut self) {
        self.enter(LifecycleState::Activating);
        match self.config().activation_mode {
            ActivationMode::Immediate => {
                // "Activate as soon as the prompt starts (or immediately if
                // no prompt)" — the prompt, if any, was already issued in
                // `handle_stasis_start`, so there is nothing further to wait
                // for here.
                self.activate_streaming();
            }
            ActivationMode::FixedDelay => {
                if !self.playback.is_playing() {
                    // No prompt configured: treat it as already ended.
                    self.timers
                        .arm(TimerName::BargeIn, d(self.config().barge_in_delay_seconds));
                }
                // Otherwise `bargeIn` arms from `on_prompt_finished` once the
                // real `PlaybackEnded` for the prompt arrives.
            }
            ActivationMode::Vad => {
                let cfg = self.config().clone();
                self.timers.arm(
                    TimerName::VadInitialSilence,
                    d(cfg.vad_initial_silence_delay_seconds),
                );
                self.timers.arm(
                    TimerName::VadActivationDelay,
                    d(cfg.vad_activation_delay_seconds),
                );
                self.emitter.emit(OperatorEvent::VadPostPromptLogicStarted {
                    call_id: self.call.id.clone(),
                });
                if !self.playback.is_playing() {
                    self.prompt_ended = true;
                }
            }
        }
    }

    /// Invoked once the prompt's own `PlaybackEnded`/`PlaybackFailed` event
    /// arrives (`PlaybackController::on_finished` confirmed it was the
    /// currently-tracked playback, not a stale barge-in-superseded one).
    async fn on_prompt_finished(&mut self) {
        if !matches!(self.call.state, LifecycleState::Activating) {
            return;
        }
        match self.config().activation_mode {
            ActivationMode::Immediate => {}
            ActivationMode::FixedDelay => {
                self.timers
                    .arm(TimerName::BargeIn, d(self.config().barge_in_delay_seconds));
            }
            ActivationMode::Vad => {
                self.prompt_ended = true;
                self.progress_vad_activation();
            }
        }
    }

    /// Require both `vadInitialSilence` and `vadActivationDelay` expired
    /// AND either `SpeechStart` observed or the prompt ended (then arm
    /// `vadMaxWaitAfterPrompt`). If `vadMode=afterPrompt`, activate
    /// unconditionally once the prompt ended and both delays have expired.
    fn progress_vad_activation(&mut self) {
        if !matches!(self.call.state, LifecycleState::Activating) {
            return;
        }
        if !(self.vad_initial_silence_expired && self.vad_activation_delay_expired) {
            return;
        }
        if self.config().vad_mode == VadMode::AfterPrompt {
            if self.prompt_ended {
                self.activate_streaming();
            }
            return;
        }
        if (self.speech_start_observed || self.prompt_ended)
            && !self.timers.is_armed(TimerName::VadMaxWaitAfterPrompt)
        {
            self.timers.arm(
                TimerName::VadMaxWaitAfterPrompt,
                d(self.config().vad_max_wait_after_prompt_seconds),
            );
        }
    }

    async fn enable_vad_sensor(&mut self) {
        self.vad_sensor_armed = true;
        let value = format!(
            "{},{}",
            self.config().vad_talk_threshold,
            self.config().vad_silence_threshold_ms
        );
        if let Err(err) = self.playback.set_channel_var(TALK_DETECT_VAR, &value).await {
            warn!(call_id = %self.call.id, %err, "failed to arm TALK_DETECT");
        }
    }

    async fn disable_vad_sensor(&mut self) {
        if !self.vad_sensor_armed {
            return;
        }
        self.vad_sensor_armed = false;
        if let Err(err) = self
            .playback
            .set_channel_var(TALK_DETECT_VAR, TALK_DETECT_REMOVE)
            .await
        {
            warn!(call_id = %self.call.id, %err, "failed to remove TALK_DETECT");
        }
    }

    fn activate_streaming(&mut self) {
        self.timers.cancel(TimerName::BargeIn);
        self.timers.cancel(TimerName::VadInitialSilence);
        self.timers.cancel(TimerName::VadActivationDelay);
        self.timers.cancel(TimerName::VadMaxWaitAfterPrompt);
        self.enter(LifecycleState::Streaming);
        self.timers.arm(
            TimerName::InitialStreamIdle,
            d(self.config().initial_stream_idle_timeout_seconds),
        );
        if self.config().dtmf_enabled {
            self.timers.arm(
                TimerName::DtmfFinal,
                d(self.config().dtmf_final_timeout_seconds),
            );
        }
        self.emitter.emit(OperatorEvent::CallResourcesInitialized {
            call_id: self.call.id.clone(),
        });
        self.spawn_recognizer_open();
    }

    fn spawn_recognizer_open(&mut self) {
        let factory = self.recognizer_factory.clone();
        let recognizer_config = self.config().recognizer.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match factory.open(recognizer_config).await {
                Ok((session, mut events)) => {
                    if tx.send(CallMessage::RecognizerOpened(session)).is_err() {
                        return;
                    }
                    while let Some(event) = events.recv().await {
                        if tx.send(CallMessage::Recognizer(event)).is_err() {
                            break;
                        }
                    }
                }
                Err(err) => {
                    let _ = tx.send(CallMessage::Recognizer(RecognizerEvent::Error {
                        fatal: true,
                        message: err.to_string(),
                    }));
                }
            }
        });
    }

    // -- audio -----------------------------------------------------------

    async fn handle_audio_frame(&mut self, frame: &[u8]) -> bool {
        if self.call.speech_disabled {
            return false;
        }

        if matches!(self.call.state, LifecycleState::Streaming) && self.frame_pump.is_attached() {
            if let Err(err) = self.frame_pump.pump(frame).await {
                warn!(call_id = %self.call.id, %err, "recognizer rejected audio frame");
                if !err.is_retryable() {
                    self.start_fallback().await;
                }
            }
        } else if !matches!(
            self.call.state,
            LifecycleState::Finalizing | LifecycleState::Closed | LifecycleState::DtmfCollecting
        ) {
            // Recognizer not open yet (still in PreRecognition/Activating, or
            // the Streaming recognizer hasn't finished its open handshake):
            // keep a bounded tail so a fallback batch transcription has
            // something to work with if streaming never comes up.
            self.buffered_audio.extend_from_slice(frame);
            if self.buffered_audio.len() > MAX_BUFFERED_AUDIO_BYTES {
                let overflow = self.buffered_audio.len() - MAX_BUFFERED_AUDIO_BYTES;
                self.buffered_audio.drain(..overflow);
                warn!(
                    call_id = %self.call.id,
                    dropped_bytes = overflow,
                    "audio frame pump buffer overflow, oldest frames dropped"
                );
            }
        }
        false
    }

    fn on_vad_transition(&mut self, transition: VadTransition) {
        match transition {
            VadTransition::SpeechStart => {
                self.speech_start_observed = true;
                self.timers.cancel(TimerName::VadInitialSilence);
                self.timers.cancel(TimerName::VadMaxWaitAfterPrompt);
                self.emitter.emit(OperatorEvent::VadSpeechDetectedStart {
                    call_id: self.call.id.clone(),
                });
                if matches!(self.call.state, LifecycleState::Activating) {
                    self.activate_streaming();
                }
            }
            VadTransition::SpeechEnd { duration_ms } => {
                debug!(call_id = %self.call.id, duration_ms, "vad speech end");
                self.emitter.emit(OperatorEvent::VadSpeechDetectedEnd {
                    call_id: self.call.id.clone(),
                });
                if matches!(self.call.state, LifecycleState::Streaming) {
                    self.timers.arm(
                        TimerName::SpeechEndSilence,
                        d(self.config().speech_end_silence_timeout_seconds),
                    );
                }
            }
        }
    }

    async fn start_fallback(&mut self) {
        self.enter(LifecycleState::FallbackBatch);
        self.timers.cancel_all();
        let audio = std::mem::take(&mut self.buffered_audio);
        let lang = self.config().recognizer.language_code.clone();
        let transcript = self.batch_fallback.transcribe(&audio, &lang).await;
        self.outcome.final_transcript = Some(transcript);
        self.finalize(TerminalReason::FinalTranscriptReceived).await;
    }

    // -- recognizer --------------------------------------------------------

    async fn handle_recognizer_event(&mut self, event: RecognizerEvent) -> bool {
        match event {
            RecognizerEvent::ActivityBegin => {
                self.timers.cancel(TimerName::NoSpeechBegin);
                self.timers.cancel(TimerName::InitialStreamIdle);
                false
            }
            RecognizerEvent::ActivityEnd => {
                self.timers.arm(
                    TimerName::SpeechEndSilence,
                    d(self.config().speech_end_silence_timeout_seconds),
                );
                false
            }
            RecognizerEvent::Transcript(transcript) => {
                self.timers.cancel(TimerName::NoSpeechBegin);
                self.timers.cancel(TimerName::InitialStreamIdle);
                if transcript.is_final {
                    self.call.history.append(ConversationTurn::message(
                        Actor::User,
                        transcript.text.clone(),
                        now_ms(),
                    ));
                    self.outcome.final_transcript = Some(transcript.text);
                    self.finalize(TerminalReason::FinalTranscriptReceived).await;
                    return true;
                }
                false
            }
            RecognizerEvent::Error { fatal, message } => {
                warn!(call_id = %self.call.id, %message, fatal, "recognizer error");
                if fatal {
                    self.finalize(TerminalReason::RecognizerFatal).await;
                    true
                } else {
                    false
                }
            }
            RecognizerEvent::Closed { .. } => false,
        }
    }

    // -- DTMF --------------------------------------------------------------

    async fn handle_dtmf_digit(&mut self, digit: char) -> bool {
        if !self.config().dtmf_enabled {
            return false;
        }
        self.call.speech_disabled = true;
        self.timers.cancel(TimerName::NoSpeechBegin);
        self.timers.cancel(TimerName::InitialStreamIdle);
        self.timers.cancel(TimerName::SpeechEndSilence);
        self.timers.cancel(TimerName::MaxRecognition);
        let _ = self.playback.stop().await;
        self.disable_vad_sensor().await;
        if let Some(mut session) = self.frame_pump.detach_recognizer() {
            let _ = session.close("dtmf_interrupt").await;
        }

        if !matches!(self.call.state, LifecycleState::DtmfCollecting) {
            self.enter(LifecycleState::DtmfCollecting);
            self.emitter.emit(OperatorEvent::DtmfModeActivated {
                call_id: self.call.id.clone(),
            });
        }

        self.timers.arm(
            TimerName::DtmfInterDigit,
            d(self.config().dtmf_inter_digit_timeout_seconds),
        );
        self.timers.cancel(TimerName::DtmfFinal);
        self.timers.arm(
            TimerName::DtmfFinal,
            d(self.config().dtmf_final_timeout_seconds),
        );

        self.dtmf.on_digit(digit);
        false
    }

    async fn finalize_dtmf(&mut self) {
        let digits = self.dtmf.take();
        self.call.history.append(ConversationTurn::message(
            Actor::Dtmf,
            digits.clone(),
            now_ms(),
        ));
        self.outcome.dtmf_digits = Some(digits.clone());
        self.emitter.emit(OperatorEvent::DtmfInputFinalized {
            call_id: self.call.id.clone(),
            digits,
        });
        self.finalize(TerminalReason::DtmfFinalTimeout).await;
    }

    // -- operator ------------------------------------------------------

    fn handle_session_update(&mut self, patch: serde_json::Value) {
        match self.call.config.merge_patch(patch) {
            Ok(()) => {
                self.emitter.emit(OperatorEvent::ConfigUpdateAck {
                    call_id: self.call.id.clone(),
                });
            }
            Err(err) => {
                self.emitter.emit(OperatorEvent::Error {
                    call_id: Some(self.call.id.clone()),
                    message: format!("invalid session.update payload: {err}"),
                });
            }
        }
    }

    // -- timers --------------------------------------------------------

    async fn handle_timer(&mut self, timer: TimerName, generation: u64) -> bool {
        if !self.timers.is_current(timer, generation) {
            return false;
        }
        self.emitter.emit(OperatorEvent::TimerEvent {
            call_id: self.call.id.clone(),
            timer,
            fired: true,
        });
        match timer {
            TimerName::NoSpeechBegin => {
                self.outcome.no_speech_begin_timeout = true;
                self.finalize(TerminalReason::AppNoSpeechBeginTimeout).await;
                true
            }
            TimerName::InitialStreamIdle => {
                self.outcome.initial_stream_idle_timeout = true;
                self.finalize(TerminalReason::AppInitialGoogleStreamIdleTimeout)
                    .await;
                true
            }
            TimerName::SpeechEndSilence => {
                self.finalize(TerminalReason::AppSilenceAfterGoogleSpeechActivityEnd)
                    .await;
                true
            }
            TimerName::MaxRecognition => {
                self.outcome.max_duration_timeout = true;
                self.finalize(TerminalReason::MaxDurationTimeout).await;
                true
            }
            TimerName::BargeIn => {
                self.activate_streaming();
                false
            }
            TimerName::VadInitialSilence => {
                self.vad_initial_silence_expired = true;
                self.progress_vad_activation();
                false
            }
            TimerName::VadActivationDelay => {
                self.vad_activation_delay_expired = true;
                self.progress_vad_activation();
                false
            }
            TimerName::VadMaxWaitAfterPrompt => {
                if self.config().vad_mode == VadMode::AfterPrompt {
                    self.activate_streaming();
                    false
                } else {
                    self.finalize(TerminalReason::VadMaxWaitAfterPromptTimeout)
                        .await;
                    true
                }
            }
            // Expiration of `dtmfInterDigit` is a no-op by itself — the
            // final timer still governs.
            TimerName::DtmfInterDigit => false,
            TimerName::DtmfFinal => {
                self.finalize_dtmf().await;
                true
            }
        }
    }

    // -- finalization ----------------------------------------------------

    fn reason_requires_hangup(reason: TerminalReason) -> bool {
        matches!(
            reason,
            TerminalReason::Hangup
                | TerminalReason::AppNoSpeechBeginTimeout
                | TerminalReason::AppInitialGoogleStreamIdleTimeout
                | TerminalReason::MaxDurationTimeout
                | TerminalReason::TelephonyFatal
                | TerminalReason::RecognizerFatal
                | TerminalReason::OperatorKill
        )
    }

    /// `fullCleanup(hangup, reason)`. Idempotent: cancel all timers →
    /// half-close then close recognizer → stop playback → detach frame pump
    /// → publish terminal event with `reason` → optionally run batch
    /// fallback (only when `hangup=true` AND a recorded audio blob exists
    /// AND speech produced no final transcript) → publish `transcript`
    /// outcome (possibly empty) → transition to `Closed`.
    async fn finalize(&mut self, reason: TerminalReason) {
        if self.call.state.is_terminal() {
            return;
        }
        self.enter(LifecycleState::Finalizing);

        self.timers.cancel_all();
        self.disable_vad_sensor().await;

        if let Some(mut session) = self.frame_pump.detach_recognizer() {
            let _ = session.half_close().await;
            let _ = session.close(reason.as_str()).await;
        }

        let _ = self.playback.stop().await;

        self.outcome.cleanup_reason = Some(reason.to_string());
        self.outcome.hangup = Self::reason_requires_hangup(reason);

        self.emitter.emit(OperatorEvent::CleanupResourceReleaseEvent {
            call_id: self.call.id.clone(),
            reason: reason.to_string(),
        });

        if self.outcome.hangup
            && !self.buffered_audio.is_empty()
            && self.outcome.final_transcript.is_none()
        {
            let audio = std::mem::take(&mut self.buffered_audio);
            let lang = self.config().recognizer.language_code.clone();
            let transcript = self.batch_fallback.transcribe(&audio, &lang).await;
            if !transcript.is_empty() {
                self.call.history.append(ConversationTurn::message(
                    Actor::User,
                    transcript.clone(),
                    now_ms(),
                ));
                self.outcome.final_transcript = Some(transcript);
            }
        }

        self.emitter.emit(OperatorEvent::ConversationHistory {
            call_id: self.call.id.clone(),
            turns: self.call.history.snapshot(),
        });

        if self.outcome.hangup {
            let _ = self.playback.hangup().await;
        }

        info!(call_id = %self.call.id, %reason, "call closed");
        self.enter(LifecycleState::Closed);
    }
}

//! Telephony Actions port — the ARI consumed contract (spec.md §6).
//!
//! The Call Orchestrator only ever sees this trait and the `AriEvent` enum;
//! `ivr-ari` owns the actual Asterisk REST Interface client and the in-memory
//! test double, and is the only crate that knows an ARI channel ID from a
//! call ID.

use async_trait::async_trait;

use crate::errors::PortError;

/// Events the orchestrator consumes from the telephony leg, already
/// translated from raw ARI/Stasis payloads by `ivr-ari`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AriEvent {
    StasisStart,
    StasisEnd,
    ChannelHangupRequest,
    ChannelDtmfReceived { digit: char },
    PlaybackStarted { playback_id: String },
    PlaybackFinished { playback_id: String },
    PlaybackFailed { playback_id: String },
    /// The platform's own talk-detect feature (armed via
    /// `setChannelVar(TALK_DETECT, "<talk>,<silence>")`) observed the start
    /// of speech. The VAD Sensor Adapter is a thin translator over this
    /// event; it performs no timing logic of its own.
    ChannelTalkingStarted,
    /// The platform's talk-detect feature observed the end of speech, with
    /// the silence/talk duration it measured.
    ChannelTalkingFinished { duration_ms: u64 },
}

/// Actions the orchestrator issues against the telephony leg.
#[async_trait]
pub trait TelephonyActions: Send + Sync {
    async fn answer(&self) -> Result<(), PortError>;

    /// Starts media playback and returns an implementation-defined
    /// playback id used to correlate the later `PlaybackFinished` event.
    async fn play_media(&self, media_uri: &str) -> Result<String, PortError>;

    async fn stop_playback(&self, playback_id: &str) -> Result<(), PortError>;

    async fn set_channel_var(&self, name: &str, value: &str) -> Result<(), PortError>;

    async fn hangup(&self) -> Result<(), PortError>;
}

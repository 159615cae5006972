//! Recognizer Session port (spec.md §4.6).
//!
//! Modeled as an open/send/half-close/close session plus a side channel of
//! events, rather than raw callbacks: the orchestrator already funnels every
//! external signal through one `mpsc` queue per call (spec.md §5), so a
//! recognizer's events are just another producer into that same shape.

use async_trait::async_trait;

use crate::domain::Transcript;
use crate::errors::PortError;

/// Events a recognizer session pushes onto its event channel. The
/// orchestrator wraps each in a `CallMessage` variant and enqueues it.
#[derive(Debug, Clone)]
pub enum RecognizerEvent {
    /// Voice activity began inside the recognizer's own VAD, if it has one.
    ActivityBegin,
    /// Voice activity ended inside the recognizer's own VAD, if it has one.
    ActivityEnd,
    /// An interim or final transcript.
    Transcript(Transcript),
    /// The recognizer reported an error; `fatal` distinguishes whether the
    /// session is still usable afterwards.
    Error { fatal: bool, message: String },
    /// The session closed, carrying the reason the remote side gave (if
    /// any was given).
    Closed { reason: Option<String> },
}

/// A single open streaming-recognition session.
#[async_trait]
pub trait RecognizerSession: Send {
    /// Push one frame of audio into the stream.
    async fn send_audio(&mut self, frame: &[u8]) -> Result<(), PortError>;

    /// Signal no more audio is coming; the session may still emit a final
    /// transcript afterwards.
    async fn half_close(&mut self) -> Result<(), PortError>;

    /// Tear the session down immediately. Idempotent.
    async fn close(&mut self, reason: &str) -> Result<(), PortError>;
}

/// Opens `RecognizerSession`s against a configured backend (Google Cloud
/// Speech streaming, OpenAI Realtime, …).
#[async_trait]
pub trait RecognizerSessionFactory: Send + Sync {
    async fn open(
        &self,
        config: crate::domain::RecognizerConfig,
    ) -> Result<
        (
            Box<dyn RecognizerSession>,
            tokio::sync::mpsc::UnboundedReceiver<RecognizerEvent>,
        ),
        PortError,
    >;
}

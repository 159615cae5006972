//! `CallMessage` — the single message type funneled through one call's
//! `mpsc` queue (spec.md §5).
//!
//! Every external signal a call can react to — a timer firing, an ARI
//! event, a recognizer event, an operator mutation — becomes one of these
//! and is enqueued from whatever task observed it. The orchestrator task is
//! the only reader, so call state never needs a lock.

use bytes::Bytes;
use tokio::sync::oneshot;

use ivr_core::{
    AriEvent, CallConfig, CallId, ConversationTurn, RecognizerEvent, RecognizerSession, TimerName,
};

pub enum CallMessage {
    /// A frame of inbound caller audio arrived from the telephony leg.
    AudioFrame(Bytes),

    /// A `Timer Registry` timer reached zero. `generation` must be checked
    /// against the registry before acting — see [`crate::timer`].
    TimerFired {
        call_id: CallId,
        timer: TimerName,
        generation: u64,
    },

    /// An ARI event arrived on the telephony leg.
    Ari(AriEvent),

    /// A recognizer session finished opening; ownership moves to the
    /// orchestrator's own frame pump so the single-writer task is the
    /// only place it is ever driven from.
    RecognizerOpened(Box<dyn RecognizerSession>),

    /// The open recognizer session produced an event.
    Recognizer(RecognizerEvent),

    /// Operator requested a live configuration patch (`session.update`).
    OperatorSessionUpdate(serde_json::Value),

    /// Operator asked for the current effective configuration.
    OperatorGetConfig { reply: oneshot::Sender<CallConfig> },

    /// Operator asked for a snapshot of the conversation history so far.
    OperatorGetHistory {
        reply: oneshot::Sender<Vec<ConversationTurn>>,
    },

    /// Operator requested the call be torn down immediately.
    OperatorKill,
}

impl std::fmt::Debug for CallMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AudioFrame(frame) => f.debug_tuple("AudioFrame").field(&frame.len()).finish(),
            Self::TimerFired {
                call_id,
                timer,
                generation,
            } => f
                .debug_struct("TimerFired")
                .field("call_id", call_id)
                .field("timer", timer)
                .field("generation", generation)
                .finish(),
            Self::Ari(event) => f.debug_tuple("Ari").field(event).finish(),
            Self::RecognizerOpened(_) => f.debug_tuple("RecognizerOpened").finish(),
            Self::Recognizer(event) => f.debug_tuple("Recognizer").field(event).finish(),
            Self::OperatorSessionUpdate(patch) => {
                f.debug_tuple("OperatorSessionUpdate").field(patch).finish()
            }
            Self::OperatorGetConfig { .. } => f.debug_struct("OperatorGetConfig").finish(),
            Self::OperatorGetHistory { .. } => f.debug_struct("OperatorGetHistory").finish(),
            Self::OperatorKill => write!(f, "OperatorKill"),
        }
    }
}

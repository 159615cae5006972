//! Domain types and port definitions shared by every crate in the
//! telephony voice-AI bridge.
//!
//! Nothing in this crate depends on a transport, a scheduler, or a
//! particular speech vendor — that is the job of `ivr-orchestrator` and the
//! adapter crates (`ivr-ari`, `ivr-recognizers`, `ivr-web`).

pub mod domain;
pub mod errors;
pub mod events;
pub mod ports;

pub use domain::{
    Actor, ActivationMode, Call, CallConfig, CallId, CallOutcome, ConversationHistory,
    ConversationTurn, LifecycleState, RecognizerConfig, TerminalReason, TimerName, Transcript,
    TurnType, VadMode, VoiceActivityTimeout,
};
pub use errors::{ErrorKind, PortError};
pub use events::OperatorEvent;
pub use ports::{
    AppEventEmitter, AriEvent, BatchFallback, NoopEmitter, RecognizerEvent, RecognizerSession,
    RecognizerSessionFactory, TelephonyActions,
};

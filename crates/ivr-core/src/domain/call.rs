//! `Call` — one entity per active phone call, and its lifecycle state
//! machine's state enum (spec.md §3, §4.8).

use serde::{Deserialize, Serialize};

use super::config::CallConfig;
use super::conversation::ConversationHistory;

/// Lifecycle state of a call (spec.md §4.8).
///
/// `DtmfCollecting` and `FallbackBatch` are parallel substates layered on
/// top of the primary chain; `DtmfCollecting` is sticky (spec.md I4: once
/// entered, speech is disabled for the remainder of the call).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    New,
    Answered,
    PreRecognition,
    Activating,
    Streaming,
    DtmfCollecting,
    FallbackBatch,
    Finalizing,
    Closed,
}

impl LifecycleState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Opaque, globally-unique (for the process lifetime) call identifier.
pub type CallId = String;

/// One active phone call.
///
/// Owns its children (Frame Pump, Recognizer Session, DTMF Collector,
/// Playback Controller, Timer Registry) by composition in
/// `ivr_orchestrator::CallOrchestrator`; this struct is the plain data
/// half of the entity — the orchestrator is the behavioral half.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    pub id: CallId,
    pub caller_id: Option<String>,
    pub state: LifecycleState,
    pub config: CallConfig,
    #[serde(skip)]
    pub history: ConversationHistory,
    /// Sticky once true: set the instant a DTMF digit is received (I4).
    /// Speech recognition is permanently disabled for the remainder of the
    /// call once this flips.
    pub speech_disabled: bool,
}

impl Call {
    #[must_use]
    pub fn new(id: CallId, caller_id: Option<String>, config: CallConfig) -> Self {
        Self {
            id,
            caller_id,
            state: LifecycleState::New,
            config,
            history: ConversationHistory::new(),
            speech_disabled: false,
        }
    }
}

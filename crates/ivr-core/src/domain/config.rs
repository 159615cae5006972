//! `CallConfig` — the recognized-options bundle for a single call.
//!
//! Every field has a `serde(default)` so a TOML config file (or an operator
//! `session.update` payload) may specify only the fields it wants to
//! override; the rest fall back to [`CallConfig::default`].

use serde::{Deserialize, Serialize};

/// How the orchestrator decides when to leave `PreRecognition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivationMode {
    /// Activate as soon as the prompt starts (or immediately with no prompt).
    Immediate,
    /// Activate `bargeInDelaySeconds` after the prompt finishes playing.
    FixedDelay,
    /// Activate once VAD observes speech or the post-prompt wait expires.
    Vad,
}

impl Default for ActivationMode {
    fn default() -> Self {
        Self::Immediate
    }
}

/// Sub-mode for `activationMode = vad`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VadMode {
    /// Require VAD-observed speech before activating.
    VadMode,
    /// Activate unconditionally once the prompt ends and delays expire.
    AfterPrompt,
}

impl Default for VadMode {
    fn default() -> Self {
        Self::VadMode
    }
}

/// Recognizer-side VAD timeout pair, split into whole seconds + nanos the
/// way the streaming recognizer's wire format requires (§6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceActivityTimeout {
    pub speech_start_timeout_seconds: f64,
    pub speech_end_timeout_seconds: f64,
}

impl Default for VoiceActivityTimeout {
    fn default() -> Self {
        Self {
            speech_start_timeout_seconds: 5.0,
            speech_end_timeout_seconds: 1.0,
        }
    }
}

/// Recognizer sub-configuration (request-side fields of §6's streaming
/// recognizer contract).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecognizerConfig {
    pub encoding: String,
    pub sample_rate_hertz: u32,
    pub language_code: String,
    pub model: String,
    pub use_enhanced: bool,
    pub interim_results: bool,
    pub single_utterance: bool,
    pub enable_word_time_offsets: bool,
    pub enable_automatic_punctuation: bool,
    pub enable_speaker_diarization: bool,
    pub enable_voice_activity_events: bool,
    pub voice_activity_timeout: VoiceActivityTimeout,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            encoding: "MULAW".to_owned(),
            sample_rate_hertz: 8_000,
            language_code: "en-US".to_owned(),
            model: "phone_call".to_owned(),
            use_enhanced: true,
            interim_results: true,
            single_utterance: false,
            enable_word_time_offsets: false,
            enable_automatic_punctuation: true,
            enable_speaker_diarization: false,
            enable_voice_activity_events: true,
            voice_activity_timeout: VoiceActivityTimeout::default(),
        }
    }
}

/// The full per-call configuration bundle (spec.md §3 `CallConfig`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallConfig {
    /// Media URI played on entering `Answered`, if any (spec.md §4.8 entry
    /// action "begin prompt playback if configured"). `None` means no
    /// prompt: activation proceeds as if the prompt had already ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_media_uri: Option<String>,

    pub activation_mode: ActivationMode,
    pub barge_in_delay_seconds: f64,

    pub no_speech_begin_timeout_seconds: f64,
    pub initial_stream_idle_timeout_seconds: f64,
    pub speech_end_silence_timeout_seconds: f64,
    pub max_recognition_duration_seconds: f64,

    pub vad_mode: VadMode,
    pub vad_initial_silence_delay_seconds: f64,
    pub vad_activation_delay_seconds: f64,
    pub vad_max_wait_after_prompt_seconds: f64,
    pub vad_silence_threshold_ms: u32,
    pub vad_talk_threshold: u32,

    pub dtmf_enabled: bool,
    pub dtmf_inter_digit_timeout_seconds: f64,
    pub dtmf_final_timeout_seconds: f64,

    pub recognizer: RecognizerConfig,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            prompt_media_uri: None,
            activation_mode: ActivationMode::default(),
            barge_in_delay_seconds: 0.5,

            no_speech_begin_timeout_seconds: 5.0,
            initial_stream_idle_timeout_seconds: 3.0,
            speech_end_silence_timeout_seconds: 1.5,
            max_recognition_duration_seconds: 30.0,

            vad_mode: VadMode::default(),
            vad_initial_silence_delay_seconds: 0.4,
            vad_activation_delay_seconds: 0.2,
            vad_max_wait_after_prompt_seconds: 5.0,
            vad_silence_threshold_ms: 500,
            vad_talk_threshold: 256,

            dtmf_enabled: true,
            dtmf_inter_digit_timeout_seconds: 3.0,
            dtmf_final_timeout_seconds: 5.0,

            recognizer: RecognizerConfig::default(),
        }
    }
}

impl CallConfig {
    /// Merge an operator `session.update` patch into this config.
    ///
    /// Only fields present (non-null) in `patch` are applied; absent fields
    /// keep their current value. Used by `ivr-web`'s `session.update`
    /// handler and by `get_call_configuration`'s round-trip guarantee.
    pub fn merge_patch(&mut self, patch: serde_json::Value) -> Result<(), serde_json::Error> {
        let mut current = serde_json::to_value(&*self)?;
        merge_json(&mut current, patch);
        *self = serde_json::from_value(current)?;
        Ok(())
    }
}

fn merge_json(base: &mut serde_json::Value, patch: serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(patch_map)) => {
            for (k, v) in patch_map {
                merge_json(base_map.entry(k).or_insert(serde_json::Value::Null), v);
            }
        }
        (base_slot, patch_value) => {
            *base_slot = patch_value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_scenario_defaults() {
        let cfg = CallConfig::default();
        assert_eq!(cfg.activation_mode, ActivationMode::Immediate);
        assert!(cfg.dtmf_enabled);
    }

    #[test]
    fn merge_patch_updates_only_named_fields() {
        let mut cfg = CallConfig::default();
        let original_no_speech = cfg.no_speech_begin_timeout_seconds;

        cfg.merge_patch(serde_json::json!({ "speechEndSilenceTimeoutSeconds": 3.0 }))
            .unwrap();

        assert!((cfg.speech_end_silence_timeout_seconds - 3.0).abs() < f64::EPSILON);
        assert!((cfg.no_speech_begin_timeout_seconds - original_no_speech).abs() < f64::EPSILON);
    }

    #[test]
    fn round_trip_through_json_preserves_all_fields() {
        let cfg = CallConfig::default();
        let json = serde_json::to_value(&cfg).unwrap();
        let back: CallConfig = serde_json::from_value(json).unwrap();
        assert_eq!(cfg, back);
    }
}

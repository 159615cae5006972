//! Startup configuration: a TOML file for the structural settings (bind
//! address, ARI endpoints, recognizer backend selection, per-call
//! defaults), plus one environment variable for the speech backend
//! credential path, read once and never logged.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use ivr_core::CallConfig;

/// Name of the one environment variable this bridge reads (spec.md §6):
/// the path to the speech backend's service-account credentials. Its
/// contents are opaque to the core — whichever recognizer backend is
/// selected decides how to use them.
pub const SPEECH_CREDENTIALS_PATH_VAR: &str = "IVR_SPEECH_CREDENTIALS_PATH";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AriSettings {
    pub base_url: String,
    pub events_ws_url: String,
    pub app_name: String,
    pub username: String,
    pub password: String,
    /// Template for a channel's external-media audio socket; `{channel_id}`
    /// is substituted per call.
    pub external_media_url_template: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum RecognizerBackendConfig {
    GoogleSpeech { endpoint: String },
    OpenaiRealtime { ws_url: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub operator_bind_addr: SocketAddr,
    pub ari: AriSettings,
    pub recognizer: RecognizerBackendConfig,
    #[serde(default)]
    pub default_call_config: CallConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }
}

/// Reads the speech backend credential path from the environment and loads
/// its contents. Never logged; callers must not `Debug`-print the result.
pub fn read_speech_credentials() -> Result<String> {
    let path = std::env::var(SPEECH_CREDENTIALS_PATH_VAR).with_context(|| {
        format!("environment variable {SPEECH_CREDENTIALS_PATH_VAR} is not set")
    })?;
    std::fs::read_to_string(&path)
        .with_context(|| format!("reading speech credentials from {path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_google_backend_config() {
        let toml = r#"
            operatorBindAddr = "0.0.0.0:8090"

            [ari]
            baseUrl = "http://localhost:8088/ari"
            eventsWsUrl = "ws://localhost:8088/ari/events?app=ivr"
            appName = "ivr"
            username = "asterisk"
            password = "secret"
            externalMediaUrlTemplate = "ws://localhost:9000/media/{channel_id}"

            [recognizer]
            backend = "google_speech"
            endpoint = "https://speech.googleapis.com:443"
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.ari.app_name, "ivr");
        assert!(matches!(
            config.recognizer,
            RecognizerBackendConfig::GoogleSpeech { .. }
        ));
    }
}

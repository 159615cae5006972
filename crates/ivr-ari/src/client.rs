//! Production `TelephonyActions` implementation: a thin REST client over
//! one already-established Asterisk ARI channel (spec.md §6).

use async_trait::async_trait;
use tracing::debug;

use ivr_core::{PortError, TelephonyActions};

use crate::error::AriError;

#[derive(Debug, Clone)]
pub struct AriConfig {
    pub base_url: String,
    pub app_name: String,
    pub username: String,
    pub password: String,
    pub channel_id: String,
}

pub struct AriClient {
    http: reqwest::Client,
    config: AriConfig,
}

impl AriClient {
    #[must_use]
    pub fn new(config: AriConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn channel_url(&self, suffix: &str) -> String {
        format!(
            "{}/channels/{}{}",
            self.config.base_url, self.config.channel_id, suffix
        )
    }

    async fn post(&self, url: String) -> Result<reqwest::Response, AriError> {
        let response = self
            .http
            .post(url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AriError::Protocol(format!(
                "ARI returned {}",
                response.status()
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl TelephonyActions for AriClient {
    async fn answer(&self) -> Result<(), PortError> {
        debug!(channel_id = %self.config.channel_id, "answering channel");
        self.post(self.channel_url("/answer")).await?;
        Ok(())
    }

    async fn play_media(&self, media_uri: &str) -> Result<String, PortError> {
        let url = format!(
            "{}?media={}",
            self.channel_url("/play"),
            urlencode(media_uri)
        );
        let response = self.post(url).await.map_err(PortError::from)?;
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PortError::from(AriError::Request(e)))?;
        body.get("id")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| {
                PortError::from(AriError::Protocol("play response missing id".to_string()))
            })
    }

    async fn stop_playback(&self, playback_id: &str) -> Result<(), PortError> {
        let url = format!("{}/playbacks/{}", self.config.base_url, playback_id);
        self.http
            .delete(url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| PortError::from(AriError::Request(e)))?;
        Ok(())
    }

    async fn set_channel_var(&self, name: &str, value: &str) -> Result<(), PortError> {
        let url = format!(
            "{}?variable={}&value={}",
            self.channel_url("/variable"),
            urlencode(name),
            urlencode(value)
        );
        self.post(url).await.map_err(PortError::from)?;
        Ok(())
    }

    async fn hangup(&self) -> Result<(), PortError> {
        let url = format!("{}/channels/{}", self.config.base_url, self.config.channel_id);
        self.http
            .delete(url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| PortError::from(AriError::Request(e)))?;
        Ok(())
    }
}

fn urlencode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

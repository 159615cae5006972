//! In-memory `TelephonyActions` double for tests that don't need a real
//! Asterisk instance.

use std::sync::Mutex;

use async_trait::async_trait;

use ivr_core::{PortError, TelephonyActions};

#[derive(Debug, Default)]
pub struct InMemoryTelephonyActions {
    pub answered: Mutex<bool>,
    pub played: Mutex<Vec<String>>,
    pub stopped: Mutex<Vec<String>>,
    pub vars: Mutex<Vec<(String, String)>>,
    pub hung_up: Mutex<bool>,
    next_playback_id: Mutex<u64>,
}

#[async_trait]
impl TelephonyActions for InMemoryTelephonyActions {
    async fn answer(&self) -> Result<(), PortError> {
        *self.answered.lock().unwrap() = true;
        Ok(())
    }

    async fn play_media(&self, media_uri: &str) -> Result<String, PortError> {
        self.played.lock().unwrap().push(media_uri.to_string());
        let mut next = self.next_playback_id.lock().unwrap();
        *next += 1;
        Ok(format!("pb-{next}"))
    }

    async fn stop_playback(&self, playback_id: &str) -> Result<(), PortError> {
        self.stopped.lock().unwrap().push(playback_id.to_string());
        Ok(())
    }

    async fn set_channel_var(&self, name: &str, value: &str) -> Result<(), PortError> {
        self.vars
            .lock()
            .unwrap()
            .push((name.to_string(), value.to_string()));
        Ok(())
    }

    async fn hangup(&self) -> Result<(), PortError> {
        *self.hung_up.lock().unwrap() = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn play_media_returns_unique_ids() {
        let actions = InMemoryTelephonyActions::default();
        let first = actions.play_media("sound:hello").await.unwrap();
        let second = actions.play_media("sound:world").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(actions.played.lock().unwrap().len(), 2);
    }
}

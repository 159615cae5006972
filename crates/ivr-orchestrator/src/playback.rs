//! Playback Controller (spec.md §4.5).
//!
//! Tracks at most one in-flight playback id at a time and correlates it
//! against the `PlaybackStarted`/`PlaybackFinished` ARI events the
//! orchestrator forwards in. A `PlaybackFinished` for an id that doesn't
//! match the current one is a stale event from a playback already
//! superseded by a barge-in stop and is ignored.

use ivr_core::{PortError, TelephonyActions};

pub struct PlaybackController {
    actions: Box<dyn TelephonyActions>,
    current: Option<String>,
}

impl PlaybackController {
    #[must_use]
    pub fn new(actions: Box<dyn TelephonyActions>) -> Self {
        Self {
            actions,
            current: None,
        }
    }

    pub async fn answer(&mut self) -> Result<(), PortError> {
        self.actions.answer().await
    }

    pub async fn play(&mut self, media_uri: &str) -> Result<(), PortError> {
        let playback_id = self.actions.play_media(media_uri).await?;
        self.current = Some(playback_id);
        Ok(())
    }

    /// Stops the current playback, if any. A no-op if nothing is playing.
    pub async fn stop(&mut self) -> Result<(), PortError> {
        if let Some(playback_id) = self.current.take() {
            self.actions.stop_playback(&playback_id).await?;
        }
        Ok(())
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    /// Clears tracking if `playback_id` matches the in-flight playback.
    /// Returns whether it matched (i.e. whether this event is current).
    pub fn on_finished(&mut self, playback_id: &str) -> bool {
        if self.current.as_deref() == Some(playback_id) {
            self.current = None;
            true
        } else {
            false
        }
    }

    /// Passes a channel variable write straight through to the telephony
    /// leg — used to arm/disarm `TALK_DETECT` and to publish outcome
    /// variables on cleanup (spec.md §6).
    pub async fn set_channel_var(&self, name: &str, value: &str) -> Result<(), PortError> {
        self.actions.set_channel_var(name, value).await
    }

    pub async fn hangup(&self) -> Result<(), PortError> {
        self.actions.hangup().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeActions {
        stopped: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TelephonyActions for FakeActions {
        async fn answer(&self) -> Result<(), PortError> {
            Ok(())
        }
        async fn play_media(&self, _media_uri: &str) -> Result<String, PortError> {
            Ok("pb-1".to_string())
        }
        async fn stop_playback(&self, _playback_id: &str) -> Result<(), PortError> {
            self.stopped.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn set_channel_var(&self, _name: &str, _value: &str) -> Result<(), PortError> {
            Ok(())
        }
        async fn hangup(&self) -> Result<(), PortError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn stale_finished_event_is_ignored() {
        let stopped = Arc::new(AtomicUsize::new(0));
        let mut controller = PlaybackController::new(Box::new(FakeActions {
            stopped: stopped.clone(),
        }));
        controller.play("sound:hello").await.unwrap();
        assert!(!controller.on_finished("some-other-id"));
        assert!(controller.is_playing());
        assert!(controller.on_finished("pb-1"));
        assert!(!controller.is_playing());
    }

    #[tokio::test]
    async fn stop_is_a_no_op_when_nothing_is_playing() {
        let stopped = Arc::new(AtomicUsize::new(0));
        let mut controller = PlaybackController::new(Box::new(FakeActions {
            stopped: stopped.clone(),
        }));
        controller.stop().await.unwrap();
        assert_eq!(stopped.load(Ordering::SeqCst), 0);
    }
}

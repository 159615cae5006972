//! Audio Frame Pump (spec.md §4.3).
//!
//! Every inbound audio frame reaches the orchestrator regardless of call
//! state; the pump is what decides whether a frame is actually worth
//! forwarding anywhere. Before a recognizer session is open, frames are
//! simply dropped — VAD energy calculation runs independently in the
//! orchestrator's own message loop and does not need this pump.

use ivr_core::{PortError, RecognizerSession};

#[derive(Default)]
pub struct AudioFramePump {
    recognizer: Option<Box<dyn RecognizerSession>>,
}

impl AudioFramePump {
    #[must_use]
    pub fn new() -> Self {
        Self { recognizer: None }
    }

    pub fn attach_recognizer(&mut self, session: Box<dyn RecognizerSession>) {
        self.recognizer = Some(session);
    }

    pub fn detach_recognizer(&mut self) -> Option<Box<dyn RecognizerSession>> {
        self.recognizer.take()
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Forwards a frame to the attached recognizer, if any. Frames that
    /// arrive with nothing attached are dropped silently — this is the
    /// normal case before activation.
    pub async fn pump(&mut self, frame: &[u8]) -> Result<(), PortError> {
        if let Some(session) = self.recognizer.as_mut() {
            session.send_audio(frame).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CountingSession {
        frames: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    #[async_trait]
    impl RecognizerSession for CountingSession {
        async fn send_audio(&mut self, _frame: &[u8]) -> Result<(), PortError> {
            self.frames.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
        async fn half_close(&mut self) -> Result<(), PortError> {
            Ok(())
        }
        async fn close(&mut self, _reason: &str) -> Result<(), PortError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn frames_before_attachment_are_dropped_without_error() {
        let mut pump = AudioFramePump::new();
        pump.pump(&[1, 2, 3]).await.unwrap();
        assert!(!pump.is_attached());
    }

    #[tokio::test]
    async fn attached_session_receives_frames() {
        let counter = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut pump = AudioFramePump::new();
        pump.attach_recognizer(Box::new(CountingSession {
            frames: counter.clone(),
        }));
        pump.pump(&[1, 2, 3]).await.unwrap();
        pump.pump(&[4, 5, 6]).await.unwrap();
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}

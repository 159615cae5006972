//! Operator event broadcaster — the `AppEventEmitter` implementation the
//! composition root hands to every `CallOrchestrator`.
//!
//! One process-wide `tokio::sync::broadcast` channel fans every emitted
//! `OperatorEvent` out to all connected operator consoles.

use ivr_core::{AppEventEmitter, OperatorEvent};
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct OperatorBroadcaster {
    sender: broadcast::Sender<OperatorEvent>,
}

impl OperatorBroadcaster {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(256)
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OperatorEvent> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl AppEventEmitter for OperatorBroadcaster {
    fn emit(&self, event: OperatorEvent) {
        // No subscribers is fine; a dropped console shouldn't fail the call.
        let _ = self.sender.send(event);
    }

    fn clone_box(&self) -> Box<dyn AppEventEmitter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_no_subscribers() {
        let broadcaster = OperatorBroadcaster::with_defaults();
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn emit_without_subscribers_does_not_panic() {
        let broadcaster = OperatorBroadcaster::with_defaults();
        AppEventEmitter::emit(&broadcaster, OperatorEvent::system_message("c1", "hi"));
    }

    #[tokio::test]
    async fn subscriber_receives_emitted_event() {
        let broadcaster = OperatorBroadcaster::with_defaults();
        let mut rx = broadcaster.subscribe();

        AppEventEmitter::emit(
            &broadcaster,
            OperatorEvent::CallAnswered {
                call_id: "call-1".into(),
            },
        );

        let event = rx.recv().await.unwrap();
        match event {
            OperatorEvent::CallAnswered { call_id } => assert_eq!(call_id, "call-1"),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}

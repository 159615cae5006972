//! Timer Registry (spec.md §4.1).
//!
//! Timers are cancelled and re-armed far more often than they are let run
//! to completion (every barge-in resets `bargeIn`, every VAD frame can
//! reset `vadInitialSilence`, …). Aborting the previous `JoinHandle` races
//! the just-spawned one under load, so instead each timer name carries a
//! generation counter: arming bumps it, cancelling bumps it, and a fired
//! timer is only honored if its captured generation still matches the
//! registry's current one. A superseded sleep fires into a no-op.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use ivr_core::{CallId, TimerName};

use crate::message::CallMessage;

struct Slot {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

/// Owns every named timer for one call. Lives on the orchestrator task and
/// is never shared across tasks.
pub struct TimerRegistry {
    call_id: CallId,
    tx: mpsc::UnboundedSender<CallMessage>,
    slots: HashMap<TimerName, Slot>,
}

impl TimerRegistry {
    #[must_use]
    pub fn new(call_id: CallId, tx: mpsc::UnboundedSender<CallMessage>) -> Self {
        Self {
            call_id,
            tx,
            slots: HashMap::new(),
        }
    }

    /// Arms `name` to fire after `duration`, superseding any previous arming.
    pub fn arm(&mut self, name: TimerName, duration: Duration) {
        let slot = self.slots.entry(name).or_insert(Slot {
            generation: 0,
            handle: None,
        });
        slot.generation += 1;
        let generation = slot.generation;
        if let Some(previous) = slot.handle.take() {
            previous.abort();
        }

        let tx = self.tx.clone();
        let call_id = self.call_id.clone();
        slot.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = tx.send(CallMessage::TimerFired {
                call_id,
                timer: name,
                generation,
            });
        }));
    }

    /// Cancels `name` if armed. A sleep already in flight is aborted, and
    /// its generation is bumped regardless so a message already in the
    /// queue (raced past the abort) is still recognized as stale.
    pub fn cancel(&mut self, name: TimerName) {
        if let Some(slot) = self.slots.get_mut(&name) {
            slot.generation += 1;
            if let Some(handle) = slot.handle.take() {
                handle.abort();
            }
        }
    }

    /// Cancels every armed timer. Called on entry to `Finalizing`/`Closed`.
    pub fn cancel_all(&mut self) {
        for name in self.slots.keys().copied().collect::<Vec<_>>() {
            self.cancel(name);
        }
    }

    /// Whether a fired-timer message with this generation is still current.
    #[must_use]
    pub fn is_current(&self, name: TimerName, generation: u64) -> bool {
        self.slots.get(&name).is_some_and(|slot| slot.generation == generation)
    }

    #[must_use]
    pub fn is_armed(&self, name: TimerName) -> bool {
        self.slots.get(&name).is_some_and(|slot| slot.handle.is_some())
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        for slot in self.slots.values_mut() {
            if let Some(handle) = slot.handle.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain_one(rx: &mut mpsc::UnboundedReceiver<CallMessage>) -> CallMessage {
        rx.recv().await.expect("channel closed")
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_supersedes_the_previous_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut registry = TimerRegistry::new("call-1".to_string(), tx);

        registry.arm(TimerName::BargeIn, Duration::from_secs(1));
        tokio::time::advance(Duration::from_millis(500)).await;
        registry.arm(TimerName::BargeIn, Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        let msg = drain_one(&mut rx).await;
        match msg {
            CallMessage::TimerFired { generation, .. } => {
                assert_eq!(generation, 2);
                assert!(registry.is_current(TimerName::BargeIn, generation));
                assert!(!registry.is_current(TimerName::BargeIn, generation - 1));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_a_fired_message_from_being_current() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut registry = TimerRegistry::new("call-1".to_string(), tx);

        registry.arm(TimerName::NoSpeechBegin, Duration::from_millis(100));
        registry.cancel(TimerName::NoSpeechBegin);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
        assert!(!registry.is_armed(TimerName::NoSpeechBegin));
    }
}

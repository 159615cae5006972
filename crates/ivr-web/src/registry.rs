//! The process-wide call registry.
//!
//! This is the only shared mutable state in the operator control plane: a
//! lookup from `CallId` to that call's `mpsc` sender. Reads take a snapshot
//! of the key set; writes (register/deregister) are fully serialized behind
//! the lock and never held across an `.await`.

use std::collections::HashMap;
use std::sync::RwLock;

use ivr_core::CallId;
use ivr_orchestrator::CallMessage;
use tokio::sync::mpsc;

#[derive(Default)]
pub struct CallRegistry {
    calls: RwLock<HashMap<CallId, mpsc::UnboundedSender<CallMessage>>>,
}

impl CallRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, call_id: CallId, tx: mpsc::UnboundedSender<CallMessage>) {
        self.calls.write().unwrap().insert(call_id, tx);
    }

    pub fn deregister(&self, call_id: &str) {
        self.calls.write().unwrap().remove(call_id);
    }

    #[must_use]
    pub fn get(&self, call_id: &str) -> Option<mpsc::UnboundedSender<CallMessage>> {
        self.calls.read().unwrap().get(call_id).cloned()
    }

    /// A read-only snapshot of the currently live call ids.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CallId> {
        self.calls.read().unwrap().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_get_then_deregister() {
        let registry = CallRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        registry.register("call-1".to_string(), tx);

        assert!(registry.get("call-1").is_some());
        assert_eq!(registry.snapshot(), vec!["call-1".to_string()]);

        registry.deregister("call-1");
        assert!(registry.get("call-1").is_none());
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn get_on_unknown_call_is_none() {
        let registry = CallRegistry::new();
        assert!(registry.get("ghost").is_none());
    }
}

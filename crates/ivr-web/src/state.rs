//! Shared application state handed to every Axum handler.

use std::sync::Arc;

use crate::broadcaster::OperatorBroadcaster;
use crate::registry::CallRegistry;

pub struct WebContext {
    pub registry: Arc<CallRegistry>,
    pub broadcaster: Arc<OperatorBroadcaster>,
}

impl WebContext {
    #[must_use]
    pub fn new(registry: Arc<CallRegistry>, broadcaster: Arc<OperatorBroadcaster>) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }
}

pub type AppState = Arc<WebContext>;

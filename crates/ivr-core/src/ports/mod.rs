//! Port traits — the seams each component is built against, implemented by
//! adapter crates (`ivr-ari`, `ivr-recognizers`, `ivr-web`) and never by
//! `ivr-orchestrator` itself.

pub mod batch_fallback;
pub mod event_emitter;
pub mod recognizer;
pub mod telephony_actions;

pub use batch_fallback::BatchFallback;
pub use event_emitter::{AppEventEmitter, NoopEmitter};
pub use recognizer::{RecognizerEvent, RecognizerSession, RecognizerSessionFactory};
pub use telephony_actions::{AriEvent, TelephonyActions};

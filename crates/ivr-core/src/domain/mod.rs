//! Domain types — plain data, independent of any infrastructure concerns
//! (transport, persistence, scheduling).

pub mod call;
pub mod config;
pub mod conversation;
pub mod outcome;
pub mod timer;
pub mod transcript;

pub use call::{Call, CallId, LifecycleState};
pub use config::{ActivationMode, CallConfig, RecognizerConfig, VadMode, VoiceActivityTimeout};
pub use conversation::{Actor, ConversationHistory, ConversationTurn, TurnType};
pub use outcome::{CallOutcome, TerminalReason};
pub use timer::TimerName;
pub use transcript::Transcript;

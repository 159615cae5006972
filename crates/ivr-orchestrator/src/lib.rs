//! The Call Orchestrator and the components it owns: the Timer Registry,
//! the Audio Frame Pump, the VAD Sensor Adapter, the DTMF Collector and the
//! Playback Controller (spec.md §4).
//!
//! Nothing here knows about Asterisk, gRPC, or WebSockets — those live in
//! `ivr-ari`, `ivr-recognizers` and `ivr-web`, which implement the ports
//! this crate is built against.

pub mod call_orchestrator;
pub mod dtmf;
pub mod error;
pub mod frame_pump;
pub mod message;
pub mod playback;
pub mod timer;
pub mod vad;

pub use call_orchestrator::CallOrchestrator;
pub use dtmf::{DtmfCollector, SpeechDisabledGate};
pub use error::OrchestratorError;
pub use frame_pump::AudioFramePump;
pub use message::CallMessage;
pub use playback::PlaybackController;
pub use timer::TimerRegistry;
pub use vad::VadTransition;

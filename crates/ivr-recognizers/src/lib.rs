//! Recognizer Session adapters — the only crates that know a specific
//! speech vendor's wire format. Each exposes a `RecognizerSessionFactory`;
//! `ivr-app` picks one per deployment based on config.

mod proto {
    pub mod speech {
        tonic::include_proto!("speech");
    }
}

pub mod batch;
pub mod error;
pub mod google;
pub mod openai_realtime;

pub use batch::WhisperBatchFallback;
pub use error::RecognizerAdapterError;
pub use google::{GoogleSpeechConfig, GoogleSpeechFactory};
pub use openai_realtime::{OpenAiRealtimeConfig, OpenAiRealtimeFactory};

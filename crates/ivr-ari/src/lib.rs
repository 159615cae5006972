//! Asterisk REST Interface adapter — the only crate that knows ARI's wire
//! format. Translates it into [`ivr_core::AriEvent`] and implements
//! [`ivr_core::TelephonyActions`] against it.

pub mod audio;
pub mod client;
pub mod error;
pub mod events;
pub mod test_double;

pub use audio::ExternalMediaReader;
pub use client::{AriClient, AriConfig};
pub use error::AriError;
pub use events::AriEventReader;
pub use test_double::InMemoryTelephonyActions;

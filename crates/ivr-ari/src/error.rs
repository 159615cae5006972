use thiserror::Error;

use ivr_core::PortError;

#[derive(Debug, Error)]
pub enum AriError {
    #[error("ARI request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("ARI websocket error: {0}")]
    WebSocket(String),

    #[error("unexpected ARI response: {0}")]
    Protocol(String),
}

impl From<AriError> for PortError {
    fn from(err: AriError) -> Self {
        match &err {
            AriError::Request(e) if e.is_connect() || e.is_timeout() => {
                Self::TelephonyTransient(err.to_string())
            }
            _ => Self::TelephonyFatal(err.to_string()),
        }
    }
}

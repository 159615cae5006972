use thiserror::Error;

use ivr_core::PortError;

#[derive(Debug, Error)]
pub enum RecognizerAdapterError {
    #[error("failed to connect to recognizer backend: {0}")]
    Connect(String),

    #[error("recognizer stream error: {0}")]
    Stream(#[from] tonic::Status),

    #[error("recognizer websocket error: {0}")]
    WebSocket(String),
}

impl From<RecognizerAdapterError> for PortError {
    fn from(err: RecognizerAdapterError) -> Self {
        match &err {
            RecognizerAdapterError::Connect(_) => Self::RecognizerTransient(err.to_string()),
            RecognizerAdapterError::Stream(status) => {
                if matches!(
                    status.code(),
                    tonic::Code::Unavailable | tonic::Code::DeadlineExceeded
                ) {
                    Self::RecognizerTransient(err.to_string())
                } else {
                    Self::RecognizerFatal(err.to_string())
                }
            }
            RecognizerAdapterError::WebSocket(_) => Self::RecognizerTransient(err.to_string()),
        }
    }
}

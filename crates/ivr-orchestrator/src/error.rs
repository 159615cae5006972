use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Port(#[from] ivr_core::PortError),

    #[error("invalid configuration patch: {0}")]
    ConfigPatch(#[from] serde_json::Error),
}

//! Batch Fallback port (spec.md §4.7).
//!
//! Used when streaming recognition cannot be established. Per spec.md §4.7
//! this path never surfaces an error to its caller: an internal failure
//! yields an empty transcript rather than propagating, so the Call
//! Orchestrator has one less failure mode to arbitrate on its hottest path.

use async_trait::async_trait;

#[async_trait]
pub trait BatchFallback: Send + Sync {
    /// Transcribe a complete utterance. Returns an empty string on any
    /// internal failure rather than an error.
    async fn transcribe(&self, audio: &[u8], language_code: &str) -> String;
}

//! Batch Fallback transcriber (spec.md §4.7): a one-shot Whisper
//! transcription used when a streaming recognizer session can't be
//! established. Per the port contract this never returns an error — any
//! failure becomes an empty transcript.

use async_openai::config::OpenAIConfig;
use async_openai::types::{AudioInput, CreateTranscriptionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use tracing::warn;

use ivr_core::BatchFallback;

pub struct WhisperBatchFallback {
    client: Client<OpenAIConfig>,
}

impl WhisperBatchFallback {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::with_config(OpenAIConfig::new().with_api_key(api_key)),
        }
    }
}

#[async_trait]
impl BatchFallback for WhisperBatchFallback {
    async fn transcribe(&self, audio: &[u8], language_code: &str) -> String {
        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8("utterance.wav".to_string(), audio.to_vec()))
            .model("whisper-1")
            .language(language_code)
            .build();

        let request = match request {
            Ok(r) => r,
            Err(err) => {
                warn!(%err, "failed to build batch transcription request");
                return String::new();
            }
        };

        match self.client.audio().transcribe(request).await {
            Ok(response) => response.text,
            Err(err) => {
                warn!(%err, "batch transcription request failed");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcription_request_builds_with_language_and_model() {
        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(
                "utterance.wav".to_string(),
                vec![0u8; 16],
            ))
            .model("whisper-1")
            .language("pt-BR")
            .build()
            .unwrap();
        assert_eq!(request.model, "whisper-1");
        assert_eq!(request.language.as_deref(), Some("pt-BR"));
    }
}

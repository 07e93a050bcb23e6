//! Remote speech-to-text over an OpenAI-compatible transcription endpoint.

use super::{is_supported_audio, transcript_metadata, Transcriber, TranscriptionResult};
use crate::config::Settings;
use crate::error::{EarningsError, Result};
use crate::metadata::Metadata;
use crate::openai::{create_audio_client, ApiClient};
use crate::report::file_name;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// Transcriber backed by a remote `audio/transcriptions` endpoint.
pub struct RemoteTranscriber {
    client: ApiClient,
    model: String,
    language: Option<String>,
}

impl RemoteTranscriber {
    /// Create a transcriber from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = create_audio_client(&settings.provider, &settings.api_key()?)?;
        Ok(Self::with_client(
            client,
            &settings.transcription.model,
            settings.transcription.language.clone(),
        ))
    }

    /// Create a transcriber with an explicit client.
    pub fn with_client(client: ApiClient, model: &str, language: Option<String>) -> Self {
        Self {
            client,
            model: model.to_string(),
            language,
        }
    }
}

#[async_trait]
impl Transcriber for RemoteTranscriber {
    #[instrument(skip(self, metadata), fields(audio_path = %audio_path.display()))]
    async fn transcribe_file(
        &self,
        audio_path: &Path,
        metadata: Metadata,
    ) -> Result<TranscriptionResult> {
        if !is_supported_audio(audio_path) {
            return Err(EarningsError::Transcription(format!(
                "Unsupported audio format: {}",
                audio_path.display()
            )));
        }

        let file_bytes = tokio::fs::read(audio_path).await.map_err(|e| {
            EarningsError::Transcription(format!("Cannot read {}: {}", audio_path.display(), e))
        })?;

        if file_bytes.is_empty() {
            return Err(EarningsError::Transcription(format!(
                "Audio file is empty: {}",
                audio_path.display()
            )));
        }

        debug!("Sending {} bytes to {}", file_bytes.len(), self.model);

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(AudioInput::from_vec_u8(file_name(audio_path), file_bytes))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson);

        if let Some(lang) = &self.language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| EarningsError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| EarningsError::Transcription(format!("Speech-to-text API error: {}", e)))?;

        let mut metadata = transcript_metadata(audio_path, metadata);
        metadata.insert("model", self.model.clone());
        if !response.language.is_empty() {
            metadata.insert("language", response.language.clone());
        }
        metadata.insert("duration_seconds", response.duration as f64);

        let transcription = response.text.trim().to_string();
        debug!("Transcribed {} characters", transcription.len());

        Ok(TranscriptionResult {
            transcription,
            metadata,
        })
    }
}

//! Speech-to-text for uploaded and scanned audio files.
//!
//! A [`Transcriber`] turns one audio file into text plus metadata. The
//! directory variant runs it over every file in a folder and keeps going when
//! a single file fails.

mod remote;

pub use remote::RemoteTranscriber;

use crate::error::Result;
use crate::metadata::{DocumentType, Metadata};
use crate::report::{file_name, scan_directory, FileOutcome};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Audio extensions accepted by the speech-to-text service.
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "m4a", "flac", "ogg", "opus", "webm", "mp4", "mpeg", "mpga",
];

/// Check if path has a supported audio extension.
pub fn is_supported_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Transcribed text with the metadata it will be stored under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub transcription: String,
    pub metadata: Metadata,
}

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one audio file.
    ///
    /// `metadata` is carried through to the result, with `document_type` set
    /// to `audio_transcript` and `filename` filled in when empty.
    async fn transcribe_file(&self, audio_path: &Path, metadata: Metadata)
        -> Result<TranscriptionResult>;

    /// Transcribe every file in `dir`, isolating per-file failures.
    async fn transcribe_directory(
        &self,
        dir: &Path,
        metadata: &Metadata,
    ) -> Result<BTreeMap<PathBuf, FileOutcome<TranscriptionResult>>> {
        let files = scan_directory(dir)?;
        info!("Transcribing {} files from {}", files.len(), dir.display());

        let mut results = BTreeMap::new();
        for path in files {
            let file_metadata = metadata.clone().with_filename(file_name(&path));
            let outcome = match self.transcribe_file(&path, file_metadata).await {
                Ok(result) => FileOutcome::Success(result),
                Err(e) => {
                    warn!("Failed to transcribe {}: {}", path.display(), e);
                    FileOutcome::failed(&e)
                }
            };
            results.insert(path, outcome);
        }

        Ok(results)
    }
}

/// Fill in the fields every transcript record carries.
pub(crate) fn transcript_metadata(audio_path: &Path, metadata: Metadata) -> Metadata {
    let mut metadata = metadata;
    if metadata.filename.is_empty() {
        metadata.filename = file_name(audio_path);
    }
    metadata.document_type = DocumentType::AudioTranscript;
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EarningsError;

    struct FailingOn(&'static str);

    #[async_trait]
    impl Transcriber for FailingOn {
        async fn transcribe_file(
            &self,
            audio_path: &Path,
            metadata: Metadata,
        ) -> Result<TranscriptionResult> {
            if file_name(audio_path) == self.0 {
                return Err(EarningsError::Transcription("service unavailable".to_string()));
            }
            Ok(TranscriptionResult {
                transcription: format!("transcript of {}", file_name(audio_path)),
                metadata: transcript_metadata(audio_path, metadata),
            })
        }
    }

    #[test]
    fn test_is_supported_audio() {
        assert!(is_supported_audio(Path::new("call.mp3")));
        assert!(is_supported_audio(Path::new("call.WAV")));
        assert!(!is_supported_audio(Path::new("report.pdf")));
        assert!(!is_supported_audio(Path::new("noext")));
    }

    #[tokio::test]
    async fn test_directory_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.mp3", "call.mp3", "z.wav"] {
            std::fs::write(dir.path().join(name), b"fake audio").unwrap();
        }

        let template = Metadata::new("", DocumentType::AudioTranscript).with_entity(Some("MDB"));
        let results = FailingOn("call.mp3")
            .transcribe_directory(dir.path(), &template)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(!results[&dir.path().join("call.mp3")].is_success());

        let ok = results[&dir.path().join("z.wav")].clone().into_result().unwrap();
        assert_eq!(ok.metadata.filename, "z.wav");
        assert_eq!(ok.metadata.entity.as_deref(), Some("MDB"));
        assert_eq!(ok.metadata.document_type, DocumentType::AudioTranscript);
    }

    #[test]
    fn test_transcript_metadata_keeps_given_filename() {
        let metadata = Metadata::new("upload.mp3", DocumentType::Document);
        let metadata = transcript_metadata(Path::new("/tmp/.tmpXYZ.mp3"), metadata);
        assert_eq!(metadata.filename, "upload.mp3");
        assert_eq!(metadata.document_type, DocumentType::AudioTranscript);
    }
}

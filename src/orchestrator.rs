//! Pipeline orchestrator for earnings-ai.
//!
//! Routes uploads and scanned files to transcription or extraction, embeds
//! the resulting text, stores it, and answers questions against the store.

use crate::config::Settings;
use crate::embedding::{exceeds_input_limit, Embedder, OpenAiEmbedder};
use crate::error::{EarningsError, Result};
use crate::extraction::{DocumentExtractor, ExtractionResult, Extractor};
use crate::metadata::{DocumentType, Metadata};
use crate::query::{Generator, OpenAiGenerator, QueryInterface, QueryResult, Source};
use crate::report::{file_name, BatchReport, FileOutcome, FileReport};
use crate::session::SessionContext;
use crate::store::{open_store, DocumentStore};
use crate::transcription::{RemoteTranscriber, Transcriber, TranscriptionResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// A file received from a user, with its declared MIME type.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type,
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(
            file_name(path),
            mime_type_for_path(path).map(str::to_string),
            bytes,
        ))
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_mime(self.mime_type.as_deref())
    }
}

/// Which pipeline a file goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Audio,
    Document,
}

impl FileKind {
    /// Audio if the declared type starts with `audio`, document otherwise.
    pub fn from_mime(mime_type: Option<&str>) -> Self {
        match mime_type {
            Some(mime) if mime.trim().to_lowercase().starts_with("audio") => FileKind::Audio,
            _ => FileKind::Document,
        }
    }

    pub fn document_type(&self) -> DocumentType {
        match self {
            FileKind::Audio => DocumentType::AudioTranscript,
            FileKind::Document => DocumentType::Document,
        }
    }
}

/// Declared MIME type for a path, by extension.
pub fn mime_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let mime = match ext.as_str() {
        "mp3" | "mpga" | "mpeg" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "flac" => "audio/flac",
        "ogg" | "opus" => "audio/ogg",
        "webm" => "audio/webm",
        "mp4" => "audio/mp4",
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "md" => "text/markdown",
        _ => return None,
    };
    Some(mime)
}

/// The main orchestrator for the earnings-ai pipeline.
pub struct Orchestrator {
    settings: Settings,
    transcriber: Arc<dyn Transcriber>,
    extractor: Arc<dyn Extractor>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn DocumentStore>,
    query: QueryInterface,
    temp_dir: PathBuf,
}

impl Orchestrator {
    /// Create an orchestrator with the remote services from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let transcriber = Arc::new(RemoteTranscriber::from_settings(&settings)?);
        let embedder = Arc::new(OpenAiEmbedder::from_settings(&settings)?);
        let generator = Arc::new(OpenAiGenerator::from_settings(&settings)?);
        let store = open_store(&settings)?;

        info!(
            "Using {} store with {} dimensions",
            settings.store.provider, settings.embedding.dimensions
        );

        Self::with_components(
            settings,
            transcriber,
            Arc::new(DocumentExtractor::new()),
            embedder,
            store,
            generator,
        )
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        transcriber: Arc<dyn Transcriber>,
        extractor: Arc<dyn Extractor>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn DocumentStore>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        if embedder.dimensions() != store.dimensions() {
            return Err(EarningsError::Config(format!(
                "Embedder produces {} dimensions but the store expects {}",
                embedder.dimensions(),
                store.dimensions()
            )));
        }

        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        let query = QueryInterface::new(store.clone(), embedder.clone(), generator)
            .configure(&settings)?;

        Ok(Self {
            settings,
            transcriber,
            extractor,
            embedder,
            store,
            query,
            temp_dir,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    pub fn query_interface(&self) -> &QueryInterface {
        &self.query
    }

    fn entity(&self) -> Option<&str> {
        self.settings.ingest.entity.as_deref()
    }

    /// Ingest a batch of uploads, one file at a time.
    #[instrument(skip_all, fields(files = uploads.len()))]
    pub async fn process_uploads(&self, uploads: Vec<UploadedFile>) -> BatchReport {
        let mut report = BatchReport::default();

        for upload in uploads {
            let file_report = match self.ingest_upload(&upload).await {
                Ok(id) => {
                    info!("Stored {} as {}", upload.name, id);
                    FileReport::success(&upload.name, format!("Stored as {}", id))
                }
                Err(e) => {
                    warn!("Failed to process {}: {}", upload.name, e);
                    FileReport::error(&upload.name, e.to_string())
                }
            };
            report.push(file_report);
        }

        report
    }

    /// Ingest one upload through a scoped temp file.
    pub async fn ingest_upload(&self, upload: &UploadedFile) -> Result<Uuid> {
        let suffix = Path::new(&upload.name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        // Removed when `temp` drops, whichever way this function returns.
        let temp = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(&self.temp_dir)?;
        tokio::fs::write(temp.path(), &upload.bytes).await?;

        let kind = upload.kind();
        let (text, metadata) = match kind {
            FileKind::Audio => {
                let metadata = Metadata::new(&upload.name, kind.document_type())
                    .with_entity(self.entity());
                let result = self.transcriber.transcribe_file(temp.path(), metadata).await?;
                (result.transcription, result.metadata)
            }
            FileKind::Document => {
                let result = self.extractor.extract_text(temp.path()).await?;
                (result.text, self.document_metadata(result.metadata, &upload.name))
            }
        };

        self.embed_and_store(&text, &metadata).await
    }

    /// Ingest every file in the audio and document directories.
    ///
    /// A missing directory is skipped with a warning.
    #[instrument(skip(self))]
    pub async fn ingest_directories(&self, audio_dir: &Path, documents_dir: &Path) -> BatchReport {
        let mut report = BatchReport::default();

        if audio_dir.is_dir() {
            let template =
                Metadata::new("", DocumentType::AudioTranscript).with_entity(self.entity());
            match self.transcriber.transcribe_directory(audio_dir, &template).await {
                Ok(results) => report.extend(self.store_transcripts(results).await),
                Err(e) => warn!("Skipping audio directory {}: {}", audio_dir.display(), e),
            }
        } else {
            warn!("Audio directory not found: {}", audio_dir.display());
        }

        if documents_dir.is_dir() {
            match self.extractor.process_directory(documents_dir).await {
                Ok(results) => report.extend(self.store_extractions(results).await),
                Err(e) => warn!("Skipping documents directory {}: {}", documents_dir.display(), e),
            }
        } else {
            warn!("Documents directory not found: {}", documents_dir.display());
        }

        info!(
            "Ingested {} files ({} failed)",
            report.succeeded(),
            report.failed()
        );
        report
    }

    async fn store_transcripts(
        &self,
        results: BTreeMap<PathBuf, FileOutcome<TranscriptionResult>>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for (path, outcome) in results {
            let stored = match outcome.into_result() {
                Ok(result) => self
                    .embed_and_store(&result.transcription, &result.metadata)
                    .await
                    .map_err(|e| e.to_string()),
                Err(error) => Err(error),
            };
            report.push(file_report(&path, stored));
        }
        report
    }

    async fn store_extractions(
        &self,
        results: BTreeMap<PathBuf, FileOutcome<ExtractionResult>>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for (path, outcome) in results {
            let stored = match outcome.into_result() {
                Ok(result) => {
                    let metadata = self.document_metadata(result.metadata, &file_name(&path));
                    self.embed_and_store(&result.text, &metadata)
                        .await
                        .map_err(|e| e.to_string())
                }
                Err(error) => Err(error),
            };
            report.push(file_report(&path, stored));
        }
        report
    }

    fn document_metadata(&self, extracted: Metadata, filename: &str) -> Metadata {
        let mut metadata = extracted.with_filename(filename);
        if metadata.entity.is_none() {
            metadata.entity = self.entity().map(str::to_string);
        }
        metadata
    }

    /// Embed text with the prefix for its document type and store it.
    pub async fn embed_and_store(&self, text: &str, metadata: &Metadata) -> Result<Uuid> {
        let prefix = match metadata.document_type {
            DocumentType::AudioTranscript => &self.settings.embedding.transcript_prefix,
            DocumentType::Document => &self.settings.embedding.document_prefix,
        };
        let max_chars = self.settings.embedding.max_input_chars;
        let mut metadata = metadata.clone();
        if exceeds_input_limit(text, max_chars) {
            warn!(
                "{} is longer than {} characters; only the beginning is embedded",
                metadata.filename, max_chars
            );
            metadata = metadata.with_field("truncated", true);
        }

        let embedding = self.embedder.embed(text, Some(prefix.as_str())).await?;
        self.store.store_document(text, &embedding, &metadata).await
    }

    /// Answer a question and append the turn to the session history.
    #[instrument(skip(self, session), fields(question = %question))]
    pub async fn ask(&self, session: &mut SessionContext, question: &str) -> Result<QueryResult> {
        let result = self.answer(question).await?;
        session.record_answer(question, &result);
        Ok(result)
    }

    /// Answer a question for the configured entity without touching any session.
    pub async fn answer(&self, question: &str) -> Result<QueryResult> {
        self.query.query(question, self.entity(), None).await
    }

    /// Retrieve passages for a query without generating an answer.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Source>> {
        self.query.retrieve(query, self.entity(), Some(limit)).await
    }
}

fn file_report(path: &Path, stored: std::result::Result<Uuid, String>) -> FileReport {
    match stored {
        Ok(id) => FileReport::success(file_name(path), format!("Stored as {}", id)),
        Err(error) => FileReport::error(file_name(path), error),
    }
}

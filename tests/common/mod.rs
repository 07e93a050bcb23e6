//! Stub services shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use earnings_ai::config::Settings;
use earnings_ai::embedding::Embedder;
use earnings_ai::extraction::{ExtractionResult, Extractor};
use earnings_ai::metadata::{DocumentType, Metadata};
use earnings_ai::orchestrator::Orchestrator;
use earnings_ai::query::Generator;
use earnings_ai::report::file_name;
use earnings_ai::store::{DocumentStore, MemoryDocumentStore};
use earnings_ai::transcription::{Transcriber, TranscriptionResult};
use earnings_ai::{EarningsError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const DIMENSIONS: usize = 64;

/// Bag-of-words embedder: each token is hashed into one of 64 buckets.
pub struct HashEmbedder;

fn bucket(token: &str) -> usize {
    // FNV-1a
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in token.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    (hash % DIMENSIONS as u64) as usize
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str, _prefix: Option<&str>) -> Result<Vec<f32>> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return Err(EarningsError::Embedding("Input text is empty".to_string()));
        }

        let mut vector = vec![0.0f32; DIMENSIONS];
        for token in tokens {
            vector[bucket(token)] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }
}

/// Transcriber that returns the file's bytes as the transcript.
///
/// Files whose upload name is in `failing` fail with a Transcription error.
#[derive(Default)]
pub struct StubTranscriber {
    pub failing: HashSet<String>,
    pub seen: Mutex<Vec<PathBuf>>,
}

impl StubTranscriber {
    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe_file(
        &self,
        audio_path: &Path,
        mut metadata: Metadata,
    ) -> Result<TranscriptionResult> {
        assert!(audio_path.exists(), "audio file should exist while processing");
        self.seen.lock().unwrap().push(audio_path.to_path_buf());

        if metadata.filename.is_empty() {
            metadata.filename = file_name(audio_path);
        }
        if self.failing.contains(&metadata.filename) {
            return Err(EarningsError::Transcription(
                "Speech-to-text API error: 503 Service Unavailable".to_string(),
            ));
        }

        let transcription = std::fs::read_to_string(audio_path)?;
        metadata.document_type = DocumentType::AudioTranscript;
        metadata.insert("model", "stub-whisper");
        Ok(TranscriptionResult {
            transcription,
            metadata,
        })
    }
}

/// Extractor that treats every file as UTF-8 text.
#[derive(Default)]
pub struct StubExtractor {
    pub seen: Mutex<Vec<PathBuf>>,
}

impl StubExtractor {
    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Extractor for StubExtractor {
    async fn extract_text(&self, path: &Path) -> Result<ExtractionResult> {
        assert!(path.exists(), "document should exist while processing");
        self.seen.lock().unwrap().push(path.to_path_buf());

        let text = std::fs::read_to_string(path)
            .map_err(|e| EarningsError::Extraction(e.to_string()))?;
        if text.trim().is_empty() {
            return Err(EarningsError::Extraction(format!(
                "No text could be extracted from {}",
                file_name(path)
            )));
        }

        Ok(ExtractionResult {
            text: text.trim().to_string(),
            metadata: Metadata::new(file_name(path), DocumentType::Document)
                .with_field("format", "text"),
        })
    }
}

/// Generator that echoes the top passage's filename.
#[derive(Default)]
pub struct StubGenerator {
    pub calls: AtomicUsize,
}

impl StubGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for StubGenerator {
    async fn generate(&self, _system: &str, user: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let first = user.lines().find(|l| l.starts_with("[1]")).unwrap_or("[1] none");
        Ok(format!("Answer based on {}", first))
    }
}

/// Settings for a memory store tagged `MDB`, with uploads under `temp_dir`.
pub fn test_settings(temp_dir: &TempDir) -> Settings {
    let mut settings = Settings::default();
    settings.general.temp_dir = temp_dir.path().display().to_string();
    settings.store.provider = "memory".to_string();
    settings.embedding.dimensions = DIMENSIONS as u32;
    settings.ingest.entity = Some("MDB".to_string());
    settings
}

/// An orchestrator wired to stubs and an in-memory store.
pub struct Harness {
    pub orchestrator: Orchestrator,
    pub transcriber: Arc<StubTranscriber>,
    pub extractor: Arc<StubExtractor>,
    pub generator: Arc<StubGenerator>,
    pub store: Arc<MemoryDocumentStore>,
    pub temp_dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_transcriber(StubTranscriber::default())
    }

    pub fn with_transcriber(transcriber: StubTranscriber) -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let settings = test_settings(&temp_dir);

        let transcriber = Arc::new(transcriber);
        let extractor = Arc::new(StubExtractor::default());
        let generator = Arc::new(StubGenerator::default());
        let store = Arc::new(MemoryDocumentStore::new(DIMENSIONS));

        let orchestrator = Orchestrator::with_components(
            settings,
            transcriber.clone(),
            extractor.clone(),
            Arc::new(HashEmbedder),
            store.clone(),
            generator.clone(),
        )
        .unwrap();

        Self {
            orchestrator,
            transcriber,
            extractor,
            generator,
            store,
            temp_dir,
        }
    }

    /// Paths the stubs were handed, which must all be gone afterwards.
    pub fn processed_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.transcriber.seen.lock().unwrap().clone();
        paths.extend(self.extractor.seen.lock().unwrap().iter().cloned());
        paths
    }

    pub async fn record_count(&self) -> usize {
        self.store.document_count().await.unwrap()
    }
}

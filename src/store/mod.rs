//! Document store abstraction.
//!
//! Persists `{text, embedding, metadata}` records and answers nearest-neighbour
//! queries over them. Writes never deduplicate: storing the same content twice
//! yields two records with distinct ids.

mod memory;
mod sqlite;

pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

use crate::config::Settings;
use crate::error::{EarningsError, Result};
use crate::metadata::{DocumentType, Metadata, MetadataFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A document stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Unique record ID.
    pub id: Uuid,
    /// Full text that was embedded.
    pub text: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Record metadata.
    pub metadata: Metadata,
    /// When this record was written.
    pub created_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Create a new record with a fresh id.
    pub fn new(text: String, embedding: Vec<f32>, metadata: Metadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            embedding,
            metadata,
            created_at: Utc::now(),
        }
    }
}

/// A search hit with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    /// The matched record.
    pub record: DocumentRecord,
    /// Cosine similarity to the query (higher is better).
    pub score: f32,
}

/// Summary of what has been ingested from one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSource {
    pub filename: String,
    pub document_type: DocumentType,
    /// Number of records for this file (more than one after re-ingestion).
    pub record_count: u32,
    /// Most recent write.
    pub last_ingested_at: DateTime<Utc>,
}

/// Trait for document store implementations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a record and return its id.
    ///
    /// There is no existence check; duplicate calls produce duplicate records.
    async fn store_document(
        &self,
        text: &str,
        embedding: &[f32],
        metadata: &Metadata,
    ) -> Result<Uuid>;

    /// Return at most `k` records ordered by descending similarity,
    /// restricted to those matching `filter`.
    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<ScoredDocument>>;

    /// Total number of records.
    async fn document_count(&self) -> Result<usize>;

    /// Ingested files, most recent first.
    async fn list_sources(&self) -> Result<Vec<StoredSource>>;

    /// Embedding length every record must have.
    fn dimensions(&self) -> usize;
}

/// Open the store selected in settings.
pub fn open_store(settings: &Settings) -> Result<Arc<dyn DocumentStore>> {
    let dimensions = settings.embedding.dimensions as usize;
    match settings.store.provider.as_str() {
        "sqlite" => Ok(Arc::new(SqliteDocumentStore::new(
            &settings.sqlite_path(),
            dimensions,
        )?)),
        "memory" => Ok(Arc::new(MemoryDocumentStore::new(dimensions))),
        other => Err(EarningsError::Config(format!(
            "Unknown store provider: {}",
            other
        ))),
    }
}

/// Reject embeddings whose length differs from the store's.
pub(crate) fn check_dimensions(expected: usize, embedding: &[f32]) -> Result<()> {
    if embedding.len() != expected {
        return Err(EarningsError::Storage(format!(
            "Embedding has {} dimensions, store expects {}",
            embedding.len(),
            expected
        )));
    }
    Ok(())
}

/// Sort hits by descending score and keep the top `k`.
pub(crate) fn rank(mut results: Vec<ScoredDocument>, k: usize) -> Vec<ScoredDocument> {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(k);
    results
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_check_dimensions() {
        assert!(check_dimensions(3, &[0.1, 0.2, 0.3]).is_ok());
        assert!(matches!(
            check_dimensions(3, &[0.1, 0.2]),
            Err(EarningsError::Storage(_))
        ));
    }

    #[test]
    fn test_open_memory_store() {
        let mut settings = Settings::default();
        settings.store.provider = "memory".to_string();
        settings.embedding.dimensions = 4;
        let store = open_store(&settings).unwrap();
        assert_eq!(store.dimensions(), 4);
    }
}

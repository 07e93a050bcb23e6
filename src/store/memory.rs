//! In-memory document store.
//!
//! Useful for testing and for throwaway sessions.

use super::{check_dimensions, cosine_similarity, rank, DocumentRecord, DocumentStore, ScoredDocument, StoredSource};
use crate::error::{EarningsError, Result};
use crate::metadata::{Metadata, MetadataFilter};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory document store.
pub struct MemoryDocumentStore {
    records: RwLock<Vec<DocumentRecord>>,
    dimensions: usize,
}

impl MemoryDocumentStore {
    /// Create an empty store for embeddings of the given length.
    pub fn new(dimensions: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            dimensions,
        }
    }

    /// Snapshot of every stored record, in insertion order.
    pub fn records(&self) -> Result<Vec<DocumentRecord>> {
        let records = self.records.read().map_err(lock_error)?;
        Ok(records.clone())
    }
}

fn lock_error<T>(e: std::sync::PoisonError<T>) -> EarningsError {
    EarningsError::Storage(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn store_document(
        &self,
        text: &str,
        embedding: &[f32],
        metadata: &Metadata,
    ) -> Result<Uuid> {
        check_dimensions(self.dimensions, embedding)?;

        let record = DocumentRecord::new(text.to_string(), embedding.to_vec(), metadata.clone());
        let id = record.id;
        self.records.write().map_err(lock_error)?.push(record);
        Ok(id)
    }

    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<ScoredDocument>> {
        let records = self.records.read().map_err(lock_error)?;

        let results: Vec<ScoredDocument> = records
            .iter()
            .filter(|r| r.embedding.len() == self.dimensions && filter.matches(&r.metadata))
            .map(|r| ScoredDocument {
                score: cosine_similarity(query_embedding, &r.embedding),
                record: r.clone(),
            })
            .collect();

        Ok(rank(results, k))
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.records.read().map_err(lock_error)?.len())
    }

    async fn list_sources(&self) -> Result<Vec<StoredSource>> {
        let records = self.records.read().map_err(lock_error)?;

        let mut sources: HashMap<(String, String), StoredSource> = HashMap::new();
        for record in records.iter() {
            let key = (
                record.metadata.filename.clone(),
                record.metadata.document_type.to_string(),
            );
            let entry = sources.entry(key).or_insert_with(|| StoredSource {
                filename: record.metadata.filename.clone(),
                document_type: record.metadata.document_type,
                record_count: 0,
                last_ingested_at: record.created_at,
            });
            entry.record_count += 1;
            if record.created_at > entry.last_ingested_at {
                entry.last_ingested_at = record.created_at;
            }
        }

        let mut sources: Vec<StoredSource> = sources.into_values().collect();
        sources.sort_by(|a, b| {
            b.last_ingested_at
                .cmp(&a.last_ingested_at)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        Ok(sources)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

//! SQLite-based document store.
//!
//! Embeddings are stored as little-endian `f32` blobs and cosine similarity is
//! computed in Rust over every candidate row. Metadata is kept as JSON, with
//! the required keys mirrored into columns for listing.

use super::{check_dimensions, cosine_similarity, rank, DocumentRecord, DocumentStore, ScoredDocument, StoredSource};
use crate::error::{EarningsError, Result};
use crate::metadata::{Metadata, MetadataFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        text TEXT NOT NULL,
        embedding BLOB NOT NULL,
        dimensions INTEGER NOT NULL,
        filename TEXT NOT NULL,
        document_type TEXT NOT NULL,
        company_ticker TEXT,
        metadata_json TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_documents_filename ON documents(filename);
    CREATE INDEX IF NOT EXISTS idx_documents_company_ticker ON documents(company_ticker);
"#;

/// SQLite-based document store.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
    dimensions: usize,
}

impl SqliteDocumentStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path, dimensions: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened SQLite document store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
            dimensions,
        })
    }

    #[cfg(test)]
    pub(crate) fn in_memory(dimensions: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            dimensions,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| EarningsError::Storage(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    /// Raw row: (id, text, embedding, metadata_json, created_at).
    fn read_row(row: &Row<'_>) -> rusqlite::Result<(String, String, Vec<u8>, String, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
    }

    fn decode_record(raw: (String, String, Vec<u8>, String, String)) -> Result<DocumentRecord> {
        let (id, text, embedding, metadata_json, created_at) = raw;
        let id = Uuid::parse_str(&id)
            .map_err(|e| EarningsError::Storage(format!("Invalid record id {}: {}", id, e)))?;
        let metadata: Metadata = serde_json::from_str(&metadata_json)
            .map_err(|e| EarningsError::Storage(format!("Invalid metadata for {}: {}", id, e)))?;

        Ok(DocumentRecord {
            id,
            text,
            embedding: Self::bytes_to_embedding(&embedding),
            metadata,
            created_at: Self::parse_timestamp(&created_at),
        })
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    #[instrument(skip(self, text, embedding, metadata), fields(filename = %metadata.filename))]
    async fn store_document(
        &self,
        text: &str,
        embedding: &[f32],
        metadata: &Metadata,
    ) -> Result<Uuid> {
        check_dimensions(self.dimensions, embedding)?;

        let record = DocumentRecord::new(text.to_string(), embedding.to_vec(), metadata.clone());
        let metadata_json = serde_json::to_string(&record.metadata)?;

        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO documents
            (id, text, embedding, dimensions, filename, document_type, company_ticker,
             metadata_json, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id.to_string(),
                record.text,
                Self::embedding_to_bytes(&record.embedding),
                record.embedding.len() as i64,
                record.metadata.filename,
                record.metadata.document_type.as_str(),
                record.metadata.entity,
                metadata_json,
                record.created_at.to_rfc3339(),
            ],
        )?;

        debug!("Stored document {}", record.id);
        Ok(record.id)
    }

    #[instrument(skip(self, query_embedding, filter))]
    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<ScoredDocument>> {
        let conn = self.lock()?;

        // Rows written under another embedding size are not comparable.
        let mut stmt = conn.prepare(
            "SELECT id, text, embedding, metadata_json, created_at FROM documents
             WHERE dimensions = ?1",
        )?;
        let rows = stmt.query_map(params![self.dimensions as i64], Self::read_row)?;

        let mut results = Vec::new();
        for row in rows {
            let record = match row.map_err(EarningsError::from).and_then(Self::decode_record) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping unreadable document row: {}", e);
                    continue;
                }
            };

            if !filter.matches(&record.metadata) {
                continue;
            }

            let score = cosine_similarity(query_embedding, &record.embedding);
            results.push(ScoredDocument { record, score });
        }

        let results = rank(results, k);
        debug!("Found {} matching documents", results.len());
        Ok(results)
    }

    async fn document_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[instrument(skip(self))]
    async fn list_sources(&self) -> Result<Vec<StoredSource>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT filename, document_type, COUNT(*) AS record_count, MAX(created_at) AS last_ingested
            FROM documents
            GROUP BY filename, document_type
            ORDER BY last_ingested DESC, filename
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let document_type: String = row.get(1)?;
            let last_ingested: String = row.get(3)?;
            Ok((row.get::<_, String>(0)?, document_type, row.get::<_, u32>(2)?, last_ingested))
        })?;

        let mut sources = Vec::new();
        for row in rows {
            let (filename, document_type, record_count, last_ingested) = row?;
            let document_type = document_type
                .parse()
                .map_err(EarningsError::Storage)?;
            sources.push(StoredSource {
                filename,
                document_type,
                record_count,
                last_ingested_at: Self::parse_timestamp(&last_ingested),
            });
        }

        Ok(sources)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

//! Text extraction from PDF, DOCX and plain-text documents.

mod document;

pub use document::DocumentExtractor;

use crate::error::{EarningsError, Result};
use crate::metadata::Metadata;
use crate::report::{file_name, scan_directory, FileOutcome};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Text,
}

impl DocumentFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            "txt" | "md" => Some(DocumentFormat::Text),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Text => "text",
        }
    }
}

/// Extracted text with the metadata it will be stored under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub text: String,
    pub metadata: Metadata,
}

/// Trait for document text extraction.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract plain text from one document.
    async fn extract_text(&self, path: &Path) -> Result<ExtractionResult>;

    /// Extract every file in `dir`, isolating per-file failures.
    async fn process_directory(
        &self,
        dir: &Path,
    ) -> Result<BTreeMap<PathBuf, FileOutcome<ExtractionResult>>> {
        let files = scan_directory(dir)?;
        info!("Extracting {} files from {}", files.len(), dir.display());

        let mut results = BTreeMap::new();
        for path in files {
            let outcome = match self.extract_text(&path).await {
                Ok(result) => FileOutcome::Success(result),
                Err(e) => {
                    warn!("Failed to extract {}: {}", file_name(&path), e);
                    FileOutcome::failed(&e)
                }
            };
            results.insert(path, outcome);
        }

        Ok(results)
    }
}

/// Reject text that is blank once trimmed.
pub(crate) fn require_text(path: &Path, text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(EarningsError::Extraction(format!(
            "No text could be extracted from {}",
            file_name(path)
        )));
    }
    Ok(trimmed.to_string())
}

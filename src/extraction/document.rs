//! Extraction backed by `pdftotext`, `pdfinfo` and `pandoc`.

use super::{require_text, DocumentFormat, ExtractionResult, Extractor};
use crate::error::{EarningsError, Result};
use crate::metadata::{DocumentType, Metadata};
use crate::report::file_name;
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::process::{Output, Stdio};
use std::sync::OnceLock;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Extractor that reads text files directly and shells out for PDF and DOCX.
#[derive(Debug, Clone, Default)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    pub fn new() -> Self {
        Self
    }

    async fn extract_pdf(&self, path: &Path, metadata: &mut Metadata) -> Result<String> {
        let output = run_tool(
            Command::new("pdftotext").arg("-layout").arg(path).arg("-"),
            "pdftotext",
        )
        .await?;
        let text = decode(path, output)?;

        // Page count is informational; a missing pdfinfo doesn't fail the file.
        match page_count(path).await {
            Ok(Some(pages)) => metadata.insert("page_count", pages),
            Ok(None) => {}
            Err(e) => warn!("Could not read page count for {}: {}", file_name(path), e),
        }

        Ok(text)
    }

    async fn extract_docx(&self, path: &Path) -> Result<String> {
        let output = run_tool(
            Command::new("pandoc")
                .arg("--from").arg("docx")
                .arg("--to").arg("plain")
                .arg("--wrap=none")
                .arg(path),
            "pandoc",
        )
        .await?;
        decode(path, output)
    }

    async fn extract_plain(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            EarningsError::Extraction(format!("Cannot read {}: {}", file_name(path), e))
        })?;
        String::from_utf8(bytes).map_err(|_| {
            EarningsError::Extraction(format!("{} is not valid UTF-8 text", file_name(path)))
        })
    }
}

#[async_trait]
impl Extractor for DocumentExtractor {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn extract_text(&self, path: &Path) -> Result<ExtractionResult> {
        let format = DocumentFormat::from_path(path).ok_or_else(|| {
            EarningsError::Extraction(format!("Unsupported document format: {}", file_name(path)))
        })?;

        if !path.is_file() {
            return Err(EarningsError::Extraction(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let mut metadata = Metadata::new(file_name(path), DocumentType::Document)
            .with_field("format", format.as_str());

        let raw = match format {
            DocumentFormat::Pdf => self.extract_pdf(path, &mut metadata).await,
            DocumentFormat::Docx => self.extract_docx(path).await,
            DocumentFormat::Text => self.extract_plain(path).await,
        }
        .map_err(into_extraction_error)?;

        let text = require_text(path, &raw)?;
        metadata.insert("char_count", text.chars().count());

        debug!("Extracted {} characters from {}", text.len(), file_name(path));
        Ok(ExtractionResult { text, metadata })
    }
}

/// Run an external tool, mapping a missing binary to `ToolNotFound`.
async fn run_tool(command: &mut Command, tool: &str) -> Result<Output> {
    let result = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(EarningsError::ToolNotFound(tool.to_string()));
        }
        Err(e) => return Err(EarningsError::ToolFailed(format!("{tool}: {e}"))),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(EarningsError::ToolFailed(format!("{tool}: {}", stderr.trim())));
    }

    Ok(output)
}

fn decode(path: &Path, output: Output) -> Result<String> {
    String::from_utf8(output.stdout).map_err(|_| {
        EarningsError::Extraction(format!("{} produced invalid UTF-8", file_name(path)))
    })
}

async fn page_count(path: &Path) -> Result<Option<u32>> {
    let output = run_tool(Command::new("pdfinfo").arg(path), "pdfinfo").await?;
    Ok(parse_page_count(&String::from_utf8_lossy(&output.stdout)))
}

/// Read the `Pages:` line of `pdfinfo` output.
fn parse_page_count(info: &str) -> Option<u32> {
    static PAGES: OnceLock<Regex> = OnceLock::new();
    let re = PAGES.get_or_init(|| Regex::new(r"(?m)^Pages:\s+(\d+)").expect("static regex"));
    re.captures(info)?.get(1)?.as_str().parse().ok()
}

fn into_extraction_error(err: EarningsError) -> EarningsError {
    match err {
        EarningsError::Extraction(_) => err,
        other => EarningsError::Extraction(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_extract_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "\n  Q3 revenue was $500M.\n").unwrap();

        let result = DocumentExtractor::new().extract_text(&path).await.unwrap();
        assert_eq!(result.text, "Q3 revenue was $500M.");
        assert_eq!(result.metadata.filename, "notes.txt");
        assert_eq!(result.metadata.document_type, DocumentType::Document);
        assert_eq!(result.metadata.extra.get("format"), Some(&json!("text")));
        assert_eq!(result.metadata.extra.get("char_count"), Some(&json!(21)));
    }

    #[tokio::test]
    async fn test_empty_document_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.md");
        std::fs::write(&path, "   \n\n").unwrap();

        let err = DocumentExtractor::new().extract_text(&path).await.unwrap_err();
        assert!(matches!(err, EarningsError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.xlsx");
        std::fs::write(&path, "data").unwrap();

        let err = DocumentExtractor::new().extract_text(&path).await.unwrap_err();
        assert!(matches!(err, EarningsError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_invalid_utf8_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x81]).unwrap();

        let err = DocumentExtractor::new().extract_text(&path).await.unwrap_err();
        assert!(matches!(err, EarningsError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_process_directory_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "Guidance raised.").unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("c.csv"), "x,y").unwrap();

        let results = DocumentExtractor::new().process_directory(dir.path()).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[&dir.path().join("a.txt")].is_success());
        assert!(!results[&dir.path().join("b.txt")].is_success());
        assert!(!results[&dir.path().join("c.csv")].is_success());
    }

    #[test]
    fn test_parse_page_count() {
        let info = "Title:          Q3 Report\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(info), Some(12));
        assert_eq!(parse_page_count("Title: x\n"), None);
    }
}

//! Per-file outcomes and batch reports.
//!
//! Ingestion never lets one file's failure abort its siblings. Each file ends
//! up as a [`FileOutcome`] (directory scans) and then as a [`FileReport`]
//! (what the user sees).

use crate::error::{EarningsError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Result of processing one file in a directory scan.
#[derive(Debug, Clone)]
pub enum FileOutcome<T> {
    Success(T),
    Error { error: String },
}

impl<T> FileOutcome<T> {
    pub fn failed(err: &EarningsError) -> Self {
        FileOutcome::Error {
            error: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Success(_))
    }

    pub fn into_result(self) -> std::result::Result<T, String> {
        match self {
            FileOutcome::Success(value) => Ok(value),
            FileOutcome::Error { error } => Err(error),
        }
    }
}

/// Status shown for a processed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Success,
    Error,
    /// Already ingested earlier in the same session.
    Skipped,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Success => write!(f, "success"),
            FileStatus::Error => write!(f, "error"),
            FileStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// `{filename, status, message}` for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub filename: String,
    pub status: FileStatus,
    pub message: String,
}

impl FileReport {
    pub fn success(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: FileStatus::Success,
            message: message.into(),
        }
    }

    pub fn error(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: FileStatus::Error,
            message: message.into(),
        }
    }

    pub fn skipped(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: FileStatus::Skipped,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FileStatus::Success
    }
}

/// Reports for a batch of files, in processing order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn push(&mut self, report: FileReport) {
        self.files.push(report);
    }

    pub fn extend(&mut self, other: BatchReport) {
        self.files.extend(other.files);
    }

    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.count(FileStatus::Error)
    }

    pub fn skipped(&self) -> usize {
        self.count(FileStatus::Skipped)
    }

    fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    /// Look up the report for a file name.
    pub fn get(&self, filename: &str) -> Option<&FileReport> {
        self.files.iter().find(|f| f.filename == filename)
    }
}

/// File name component of a path, lossily converted.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Regular, non-hidden files directly inside `dir`, sorted by path.
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(EarningsError::InvalidInput(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| !file_name(p).starts_with('.'))
        .collect();

    files.sort();
    Ok(files)
}

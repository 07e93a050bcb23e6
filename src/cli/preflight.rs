//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{EarningsError, Result};
use std::process::Command;

/// Extraction tools and the argument that makes them print a version.
pub const EXTRACTION_TOOLS: &[(&str, &str)] = &[
    ("pdftotext", "-v"),
    ("pdfinfo", "-v"),
    ("pandoc", "--version"),
];

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion calls the speech-to-text and embedding services.
    Ingest,
    /// Asking questions calls the embedding and generation services.
    Ask,
    /// Listing only reads the local store.
    List,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ingest | Operation::Ask => check_api_key(settings),
        Operation::List => Ok(()),
    }
}

/// Extraction tools that are not installed.
///
/// Missing tools only fail the files that need them, so callers warn instead
/// of aborting.
pub fn missing_tools() -> Vec<&'static str> {
    EXTRACTION_TOOLS
        .iter()
        .filter(|(name, arg)| check_tool(name, arg).is_err())
        .map(|(name, _)| *name)
        .collect()
}

fn check_api_key(settings: &Settings) -> Result<()> {
    settings.api_key().map(|_| ()).map_err(|e| {
        EarningsError::Config(format!(
            "{}. Set it with: export FIREWORKS_API_KEY='...' or provider.api_key in the config file",
            e
        ))
    })
}

/// Check if an external tool can be started.
///
/// Poppler tools exit non-zero for `-v` on some versions, so only a missing
/// binary counts as a failure.
pub fn check_tool(name: &str, version_arg: &str) -> Result<()> {
    match Command::new(name).arg(version_arg).output() {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(EarningsError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(EarningsError::ToolFailed(format!("{}: {}", name, e))),
    }
}

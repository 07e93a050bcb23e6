//! Embedding generation for storage and retrieval.

mod openai;

pub use openai::OpenAiEmbedder;

use crate::error::{EarningsError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for `text`, optionally preceded by a semantic
    /// prefix such as `"document: "`.
    ///
    /// Empty input (after normalization) is an error, as is a vector whose
    /// length differs from [`Embedder::dimensions`].
    async fn embed(&self, text: &str, prefix: Option<&str>) -> Result<Vec<f32>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

fn whitespace() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Collapse whitespace runs and trim.
pub fn normalize_text(text: &str) -> String {
    whitespace().replace_all(text.trim(), " ").into_owned()
}

/// Build the exact string sent to the embedding service.
///
/// The text is normalized, truncated to `max_chars` characters, and prefixed.
pub fn prepare_input(text: &str, prefix: Option<&str>, max_chars: usize) -> Result<String> {
    let normalized = normalize_text(text);
    if normalized.is_empty() {
        return Err(EarningsError::Embedding(
            "Input text is empty after normalization".to_string(),
        ));
    }

    let body = match normalized.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            warn!("Embedding input truncated to {} characters", max_chars);
            &normalized[..cut]
        }
        None => normalized.as_str(),
    };

    Ok(match prefix.filter(|p| !p.is_empty()) {
        Some(p) => format!("{}{}", p, body),
        None => body.to_string(),
    })
}

/// Whether `text` will be cut short by [`prepare_input`].
pub fn exceeds_input_limit(text: &str, max_chars: usize) -> bool {
    normalize_text(text).chars().nth(max_chars).is_some()
}

/// Check a returned vector against the expected dimensions.
pub fn check_embedding(embedding: &[f32], expected: usize) -> Result<()> {
    if embedding.len() != expected {
        return Err(EarningsError::Embedding(format!(
            "Embedding service returned {} dimensions, expected {}",
            embedding.len(),
            expected
        )));
    }
    Ok(())
}

//! Retrieved passages and how they are presented.

use crate::metadata::Metadata;
use crate::store::ScoredDocument;
use serde::{Deserialize, Serialize};

/// A retrieved passage backing an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Full text of the stored record.
    pub text: String,
    /// Record metadata (filename, document type, entity, ...).
    pub metadata: Metadata,
    /// Cosine similarity to the question.
    pub score: f32,
}

impl From<ScoredDocument> for Source {
    fn from(hit: ScoredDocument) -> Self {
        Self {
            text: hit.record.text,
            metadata: hit.record.metadata,
            score: hit.score,
        }
    }
}

impl Source {
    /// First `max_chars` characters of the text, with an ellipsis if cut.
    pub fn preview(&self, max_chars: usize) -> String {
        match self.text.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &self.text[..cut]),
            None => self.text.clone(),
        }
    }
}

/// Format sources as numbered passages for the prompt.
pub fn format_context_for_prompt(sources: &[Source]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            format!(
                "---\n[{}] {} ({}, score {:.2})\n{}\n---",
                i + 1,
                source.metadata.filename,
                source.metadata.document_type,
                source.score,
                source.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One line per source for terminal display.
pub fn format_sources_for_display(sources: &[Source]) -> String {
    sources
        .iter()
        .map(|s| format!("{} (confidence: {:.2})", s.metadata.filename, s.score))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::DocumentType;

    fn source(filename: &str, text: &str, score: f32) -> Source {
        Source {
            text: text.to_string(),
            metadata: Metadata::new(filename, DocumentType::Document),
            score,
        }
    }

    #[test]
    fn test_format_context_numbers_passages() {
        let sources = vec![
            source("report.pdf", "Q3 revenue was $500M.", 0.91),
            source("call.mp3", "We raised guidance.", 0.4),
        ];
        let context = format_context_for_prompt(&sources);

        assert!(context.contains("[1] report.pdf (document, score 0.91)"));
        assert!(context.contains("[2] call.mp3"));
        assert!(context.find("[1]").unwrap() < context.find("[2]").unwrap());
    }

    #[test]
    fn test_display_uses_two_decimals() {
        let display = format_sources_for_display(&[source("report.pdf", "x", 0.876)]);
        assert_eq!(display, "report.pdf (confidence: 0.88)");
    }

    #[test]
    fn test_preview() {
        let s = source("a.txt", "abcdef", 1.0);
        assert_eq!(s.preview(3), "abc...");
        assert_eq!(s.preview(10), "abcdef");
    }
}

//! Per-user interactive session state.

use crate::orchestrator::UploadedFile;
use crate::query::{QueryResult, Source};
use crate::report::{BatchReport, FileReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One question and its answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
    pub sources: Vec<Source>,
}

/// Chat history and the files ingested during this session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    pub chat_history: Vec<ChatTurn>,
    pub processed_files: BTreeSet<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember successfully ingested files from an upload batch.
    pub fn record_batch(&mut self, report: &BatchReport) {
        self.processed_files.extend(
            report
                .files
                .iter()
                .filter(|f| f.is_success())
                .map(|f| f.filename.clone()),
        );
    }

    /// Split off uploads whose name was already ingested this session.
    ///
    /// Returns the uploads still to process and a skip report for the rest.
    pub fn filter_new_uploads(&self, uploads: Vec<UploadedFile>) -> (Vec<UploadedFile>, BatchReport) {
        let mut skipped = BatchReport::default();
        let fresh = uploads
            .into_iter()
            .filter(|upload| {
                let seen = self.processed_files.contains(&upload.name);
                if seen {
                    skipped.push(FileReport::skipped(
                        &upload.name,
                        "Already processed in this session",
                    ));
                }
                !seen
            })
            .collect();
        (fresh, skipped)
    }

    pub fn record_answer(&mut self, question: &str, result: &QueryResult) {
        self.chat_history.push(ChatTurn {
            question: question.to_string(),
            answer: result.response.clone(),
            sources: result.sources.clone(),
        });
    }

    /// Forget the conversation. Processed files are kept.
    pub fn clear_history(&mut self) {
        self.chat_history.clear();
    }
}

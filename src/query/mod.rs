//! Question answering over stored documents.
//!
//! A question is embedded, the nearest records are retrieved (optionally
//! restricted to one entity), and a model writes an answer grounded in the
//! retrieved passages. When nothing is retrieved the model is not called.

pub mod context;
mod generator;

pub use context::{format_context_for_prompt, format_sources_for_display, Source};
pub use generator::{Generator, OpenAiGenerator};

use crate::config::{Prompts, Settings};
use crate::embedding::Embedder;
use crate::error::{EarningsError, Result};
use crate::metadata::MetadataFilter;
use crate::store::DocumentStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Answer returned when retrieval finds nothing.
pub const NO_RESULTS_RESPONSE: &str =
    "No relevant documents found for this question. Try uploading related files first.";

/// A generated answer with the passages it was based on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub response: String,
    /// Sources in retrieval order.
    pub sources: Vec<Source>,
}

impl QueryResult {
    pub fn format_for_display(&self) -> String {
        let mut output = self.response.clone();
        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            output.push_str(&format_sources_for_display(&self.sources));
        }
        output
    }
}

/// Retrieval plus generation.
pub struct QueryInterface {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    prompts: Prompts,
    query_prefix: String,
    num_results: usize,
    min_score: f32,
}

impl QueryInterface {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            prompts: Prompts::default(),
            query_prefix: String::new(),
            num_results: 5,
            min_score: 0.0,
        }
    }

    /// Apply prompt, prefix and retrieval settings.
    pub fn configure(mut self, settings: &Settings) -> Result<Self> {
        self.prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        self.query_prefix = settings.embedding.query_prefix.clone();
        self.num_results = settings.query.num_results;
        self.min_score = settings.query.min_score;
        Ok(self)
    }

    /// Retrieve passages without generating an answer.
    pub async fn retrieve(
        &self,
        question: &str,
        entity: Option<&str>,
        num_results: Option<usize>,
    ) -> Result<Vec<Source>> {
        let k = num_results.unwrap_or(self.num_results);
        if k == 0 {
            return Err(EarningsError::InvalidInput(
                "num_results must be greater than zero".to_string(),
            ));
        }

        let prefix = Some(self.query_prefix.as_str()).filter(|p| !p.is_empty());
        let query_embedding = self.embedder.embed(question, prefix).await?;

        let hits = self
            .store
            .similarity_search(&query_embedding, k, &MetadataFilter::entity(entity))
            .await?;

        Ok(hits
            .into_iter()
            .filter(|hit| hit.score >= self.min_score)
            .map(Source::from)
            .collect())
    }

    /// Answer a question from the stored documents.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn query(
        &self,
        question: &str,
        entity: Option<&str>,
        num_results: Option<usize>,
    ) -> Result<QueryResult> {
        info!("Processing question: {}", question);

        let sources = self.retrieve(question, entity, num_results).await?;

        if sources.is_empty() {
            debug!("No passages retrieved, skipping generation");
            return Ok(QueryResult {
                response: NO_RESULTS_RESPONSE.to_string(),
                sources,
            });
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context_for_prompt(&sources));
        let user_prompt = self.prompts.render_with_custom(&self.prompts.query.user, &vars);

        let response = self
            .generator
            .generate(&self.prompts.query.system, &user_prompt)
            .await
            .map_err(|e| match e {
                EarningsError::Query(_) => e,
                other => EarningsError::Query(other.to_string()),
            })?;

        debug!("Generated response with {} sources", sources.len());
        Ok(QueryResult { response, sources })
    }
}

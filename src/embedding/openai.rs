//! OpenAI-compatible embeddings implementation.

use super::{check_embedding, prepare_input, Embedder};
use crate::config::Settings;
use crate::error::{EarningsError, Result};
use crate::openai::{create_client, ApiClient};
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Embedder backed by a remote `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: ApiClient,
    model: String,
    dimensions: usize,
    max_input_chars: usize,
}

impl OpenAiEmbedder {
    /// Create an embedder from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = create_client(&settings.provider, &settings.api_key()?)?;
        Ok(Self::with_client(
            client,
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
            settings.embedding.max_input_chars,
        ))
    }

    /// Create an embedder with an explicit client.
    pub fn with_client(
        client: ApiClient,
        model: &str,
        dimensions: usize,
        max_input_chars: usize,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            dimensions,
            max_input_chars,
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    #[instrument(skip(self, text), fields(model = %self.model, chars = text.len()))]
    async fn embed(&self, text: &str, prefix: Option<&str>) -> Result<Vec<f32>> {
        let input = prepare_input(text, prefix, self.max_input_chars)?;

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::String(input))
            .build()
            .map_err(|e| EarningsError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| EarningsError::Embedding(format!("Embedding API error: {}", e)))?;

        let embedding = response
            .data
            .into_iter()
            .min_by_key(|e| e.index)
            .map(|e| e.embedding)
            .ok_or_else(|| EarningsError::Embedding("Empty embedding response".to_string()))?;

        check_embedding(&embedding, self.dimensions)?;

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::create_client_for;
    use mockito::Server;
    use serde_json::json;
    use std::time::Duration;

    fn embedding_body(vector: &[f32]) -> String {
        json!({
            "object": "list",
            "data": [{ "object": "embedding", "index": 0, "embedding": vector }],
            "model": "test-embed",
            "usage": { "prompt_tokens": 4, "total_tokens": 4 }
        })
        .to_string()
    }

    fn embedder(server: &Server, dimensions: usize) -> OpenAiEmbedder {
        let client = create_client_for(&server.url(), "test-key", Duration::from_secs(5)).unwrap();
        OpenAiEmbedder::with_client(client, "test-embed", dimensions, 1000)
    }

    #[tokio::test]
    async fn test_embed_sends_prefixed_input() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/embeddings")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "test-embed",
                "input": "document: Q3 revenue was $500M"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(embedding_body(&[0.1, 0.2, 0.3]))
            .create_async()
            .await;

        let embedding = embedder(&server, 3)
            .embed("Q3 revenue   was $500M", Some("document: "))
            .await
            .unwrap();

        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_embedding_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(embedding_body(&[0.1, 0.2]))
            .create_async()
            .await;

        let err = embedder(&server, 3).embed("text", None).await.unwrap_err();
        assert!(matches!(err, EarningsError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_remote_error_is_embedding_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/embeddings")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "error": {
                        "message": "model not found",
                        "type": "invalid_request_error",
                        "param": null,
                        "code": null
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let err = embedder(&server, 3).embed("text", None).await.unwrap_err();
        assert!(matches!(err, EarningsError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_empty_input_never_calls_service() {
        let mut server = Server::new_async().await;
        let mock = server.mock("POST", "/embeddings").expect(0).create_async().await;

        let err = embedder(&server, 3).embed("  \n ", Some("document: ")).await.unwrap_err();
        assert!(matches!(err, EarningsError::Embedding(_)));
        mock.assert_async().await;
    }
}

//! Answer generation over chat completions.

use crate::config::Settings;
use crate::error::{EarningsError, Result};
use crate::openai::{create_client, ApiClient};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Trait for text generation.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce an answer for a system prompt and a rendered user prompt.
    ///
    /// Never returns an empty string; that is reported as a `Query` error.
    async fn generate(&self, system: &str, user: &str) -> Result<String>;
}

/// Generator backed by a remote `/chat/completions` endpoint.
pub struct OpenAiGenerator {
    client: ApiClient,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiGenerator {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = create_client(&settings.provider, &settings.api_key()?)?;
        Ok(Self::with_client(client, &settings.query.model)
            .with_sampling(settings.query.temperature, settings.query.max_tokens))
    }

    pub fn with_client(client: ApiClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    #[allow(deprecated)]
    #[instrument(skip(self, system, user), fields(model = %self.model))]
    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| EarningsError::Query(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| EarningsError::Query(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| EarningsError::Query(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            EarningsError::Query(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| EarningsError::Query("Empty response from model".to_string()))?;

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::create_client_for;
    use mockito::Server;
    use serde_json::json;
    use std::time::Duration;

    fn completion_body(content: &str) -> String {
        json!({
            "id": "cmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "test-llm",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        })
        .to_string()
    }

    fn generator(server: &Server) -> OpenAiGenerator {
        let client = create_client_for(&server.url(), "test-key", Duration::from_secs(5)).unwrap();
        OpenAiGenerator::with_client(client, "test-llm").with_sampling(0.2, 256)
    }

    #[tokio::test]
    async fn test_generate_returns_answer() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "test-llm",
                "max_tokens": 256
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("Q3 revenue was $500M [1]."))
            .create_async()
            .await;

        let answer = generator(&server).generate("system", "question").await.unwrap();
        assert_eq!(answer, "Q3 revenue was $500M [1].");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_blank_answer_is_query_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("   "))
            .create_async()
            .await;

        let err = generator(&server).generate("system", "question").await.unwrap_err();
        assert!(matches!(err, EarningsError::Query(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_query_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "error": {
                        "message": "bad request",
                        "type": "invalid_request_error",
                        "param": null,
                        "code": null
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let err = generator(&server).generate("system", "question").await.unwrap_err();
        assert!(matches!(err, EarningsError::Query(_)));
    }
}

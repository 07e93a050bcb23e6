//! OpenAI-compatible client construction.
//!
//! Every remote service (speech-to-text, embeddings, generation) speaks the
//! OpenAI wire format, so one `async-openai` client type covers them all.
//! The provider defaults to Fireworks.

use crate::config::ProviderSettings;
use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// OpenAI client type used throughout the crate.
pub type ApiClient = Client<OpenAIConfig>;

/// Create a client for the inference API (embeddings and generation).
pub fn create_client(provider: &ProviderSettings, api_key: &str) -> Result<ApiClient> {
    create_client_for(&provider.api_base, api_key, Duration::from_secs(provider.timeout_secs))
}

/// Create a client for the speech-to-text API.
///
/// Some providers host transcription on a separate base URL.
pub fn create_audio_client(provider: &ProviderSettings, api_key: &str) -> Result<ApiClient> {
    create_client_for(
        &provider.audio_api_base,
        api_key,
        Duration::from_secs(provider.timeout_secs),
    )
}

/// Create a client against an explicit base URL with a request timeout.
pub fn create_client_for(api_base: &str, api_key: &str, timeout: Duration) -> Result<ApiClient> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let config = OpenAIConfig::new()
        .with_api_base(api_base.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}

//! Configuration module for earnings-ai.
//!
//! Handles loading application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, QueryPrompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, IngestSettings, PromptSettings, ProviderSettings,
    QuerySettings, Settings, StoreSettings, TranscriptionSettings, API_KEY_ENV_VARS,
};

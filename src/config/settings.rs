//! Configuration settings for earnings-ai.

use crate::error::{EarningsError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables consulted, in order, when no API key is configured.
pub const API_KEY_ENV_VARS: &[&str] = &["FIREWORKS_API_KEY", "OPENAI_API_KEY"];

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub provider: ProviderSettings,
    pub transcription: TranscriptionSettings,
    pub embedding: EmbeddingSettings,
    pub store: StoreSettings,
    pub query: QuerySettings,
    pub ingest: IngestSettings,
    pub prompts: PromptSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for temporary upload files.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.earnings-ai".to_string(),
            temp_dir: "/tmp/earnings-ai".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Remote AI provider settings (OpenAI-compatible API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// API key. Falls back to `FIREWORKS_API_KEY` / `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    /// Base URL for embeddings and chat completions.
    pub api_base: String,
    /// Base URL for audio transcription.
    pub audio_api_base: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://api.fireworks.ai/inference/v1".to_string(),
            audio_api_base: "https://audio-prod.api.fireworks.ai/v1".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Speech-to-text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Transcription model.
    pub model: String,
    /// Optional language hint (ISO-639-1).
    pub language: Option<String>,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-v3".to_string(),
            language: None,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions. Every stored vector must have this length.
    pub dimensions: u32,
    /// Prefix applied to extracted document text.
    pub document_prefix: String,
    /// Prefix applied to audio transcripts.
    pub transcript_prefix: String,
    /// Prefix applied to questions before retrieval. Empty means none.
    pub query_prefix: String,
    /// Inputs longer than this are truncated before embedding.
    pub max_input_chars: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "nomic-ai/nomic-embed-text-v1.5".to_string(),
            dimensions: 768,
            document_prefix: "document: ".to_string(),
            transcript_prefix: "audio_transcript: ".to_string(),
            query_prefix: String::new(),
            max_input_chars: 24_000,
        }
    }
}

/// Document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Store provider (sqlite, memory).
    pub provider: String,
    /// Path to the SQLite database (for the sqlite provider).
    pub sqlite_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.earnings-ai/documents.db".to_string(),
        }
    }
}

/// Question answering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Generation model.
    pub model: String,
    /// Number of passages retrieved per question.
    pub num_results: usize,
    /// Minimum similarity score for a passage to be used.
    pub min_score: f32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens in a generated answer.
    pub max_tokens: u32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            model: "accounts/fireworks/models/llama-v3p1-70b-instruct".to_string(),
            num_results: 5,
            min_score: 0.0,
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

/// Ingestion settings for the batch entry point and uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Directory scanned for audio files.
    pub audio_dir: String,
    /// Directory scanned for documents.
    pub documents_dir: String,
    /// Entity tag attached to every ingested record (stored as `company_ticker`).
    pub entity: Option<String>,
    /// Questions run after a batch ingestion.
    pub example_queries: Vec<String>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            audio_dir: "data/audio".to_string(),
            documents_dir: "data/documents".to_string(),
            entity: Some("MDB".to_string()),
            example_queries: vec![
                "What is the total q3 earnings for fiscal 2025?".to_string(),
                "what is the future of AI at Mongo? Is it going to be big?".to_string(),
            ],
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}


impl Settings {
    /// Load settings from the first configuration file found, or defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or the default locations if None.
    ///
    /// An explicit path that does not exist is an error.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => {
                return Err(EarningsError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            Some(p) => Some(p.clone()),
            None => Self::candidate_paths().into_iter().find(|p| p.exists()),
        };

        let settings = match config_path {
            Some(p) => Self::from_toml(&std::fs::read_to_string(&p)?)?,
            None => Settings::default(),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check settings that would otherwise fail deep inside a request.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("provider.api_base", &self.provider.api_base),
            ("provider.audio_api_base", &self.provider.audio_api_base),
        ] {
            url::Url::parse(value).map_err(|e| {
                EarningsError::Config(format!("{} is not a valid URL ({}): {}", name, value, e))
            })?;
        }

        if self.embedding.dimensions == 0 {
            return Err(EarningsError::Config(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }

        if self.query.num_results == 0 {
            return Err(EarningsError::Config(
                "query.num_results must be greater than zero".to_string(),
            ));
        }

        match self.store.provider.as_str() {
            "sqlite" | "memory" => Ok(()),
            other => Err(EarningsError::Config(format!(
                "Unknown store provider: {}",
                other
            ))),
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| EarningsError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Config files searched when no explicit path is given.
    pub fn candidate_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from("config").join("config.toml"),
            Self::default_config_path(),
        ]
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("earnings-ai")
            .join("config.toml")
    }

    /// Resolve the provider API key from config or environment.
    pub fn api_key(&self) -> Result<String> {
        if let Some(key) = self.provider.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(key.clone());
        }

        API_KEY_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|k| !k.is_empty()))
            .ok_or_else(|| {
                EarningsError::Config(format!(
                    "No API key configured. Set provider.api_key or export {}",
                    API_KEY_ENV_VARS.join(" / ")
                ))
            })
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.store.sqlite_path)
    }

    /// Get the expanded audio ingestion directory.
    pub fn audio_dir(&self) -> PathBuf {
        Self::expand_path(&self.ingest.audio_dir)
    }

    /// Get the expanded document ingestion directory.
    pub fn documents_dir(&self) -> PathBuf {
        Self::expand_path(&self.ingest.documents_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.ingest.audio_dir, "data/audio");
        assert_eq!(settings.ingest.documents_dir, "data/documents");
        assert_eq!(settings.ingest.example_queries.len(), 2);
        assert_eq!(settings.embedding.dimensions, 768);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            [provider]
            api_key = "fw-test"

            [store]
            sqlite_path = "/var/lib/earnings/documents.db"

            [query]
            num_results = 3
            "#,
        )
        .unwrap();

        assert_eq!(settings.provider.api_key.as_deref(), Some("fw-test"));
        assert_eq!(settings.sqlite_path(), PathBuf::from("/var/lib/earnings/documents.db"));
        assert_eq!(settings.query.num_results, 3);
        assert_eq!(settings.query.temperature, 0.7);
        assert_eq!(settings.embedding.model, "nomic-ai/nomic-embed-text-v1.5");
    }

    #[test]
    fn test_configured_api_key_wins() {
        let mut settings = Settings::default();
        settings.provider.api_key = Some("configured".to_string());
        assert_eq!(settings.api_key().unwrap(), "configured");
    }

    #[test]
    fn test_invalid_api_base_rejected() {
        let mut settings = Settings::default();
        settings.provider.api_base = "not a url".to_string();
        assert!(matches!(settings.validate(), Err(EarningsError::Config(_))));
    }

    #[test]
    fn test_unknown_store_provider_rejected() {
        let mut settings = Settings::default();
        settings.store.provider = "mongodb".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let path = PathBuf::from("/definitely/not/here/config.toml");
        assert!(Settings::load_from(Some(&path)).is_err());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.ingest.entity = Some("ACME".to_string());
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.ingest.entity.as_deref(), Some("ACME"));
    }
}

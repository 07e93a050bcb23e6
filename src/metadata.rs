//! Typed metadata attached to every stored document.
//!
//! Two keys are always present, `filename` and `document_type`. The entity tag
//! is serialized as `company_ticker`. Anything a provider or extractor reports
//! beyond that lives in the open `extra` map.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Serialized name of the entity tag.
pub const ENTITY_KEY: &str = "company_ticker";

/// Kind of content a record was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Text produced by the speech-to-text service.
    AudioTranscript,
    /// Text extracted from a PDF, DOCX or plain-text file.
    Document,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::AudioTranscript => "audio_transcript",
            DocumentType::Document => "document",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "audio_transcript" | "audio" => Ok(DocumentType::AudioTranscript),
            "document" => Ok(DocumentType::Document),
            _ => Err(format!("Unknown document type: {}", s)),
        }
    }
}

/// Metadata for a document record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Original file name as uploaded or found on disk.
    pub filename: String,
    /// Whether the text came from audio or a document.
    pub document_type: DocumentType,
    /// Entity (ticker) the content belongs to.
    #[serde(rename = "company_ticker", default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// Provider- and format-specific fields.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Metadata {
    pub fn new(filename: impl Into<String>, document_type: DocumentType) -> Self {
        Self {
            filename: filename.into(),
            document_type,
            entity: None,
            extra: BTreeMap::new(),
        }
    }

    /// Set the entity tag.
    pub fn with_entity(mut self, entity: Option<impl Into<String>>) -> Self {
        self.entity = entity.map(Into::into);
        self
    }

    /// Replace the file name.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Add an extension field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert an extension field. Reserved keys are routed to their typed slot.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            "filename" => {
                if let Some(s) = value.as_str() {
                    self.filename = s.to_string();
                }
            }
            "document_type" => {
                if let Some(t) = value.as_str().and_then(|s| s.parse().ok()) {
                    self.document_type = t;
                }
            }
            ENTITY_KEY => self.entity = value.as_str().map(str::to_string),
            _ => {
                self.extra.insert(key, value);
            }
        }
    }

    /// Look up any key, including the required ones, as a JSON value.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "filename" => Some(Value::String(self.filename.clone())),
            "document_type" => Some(Value::String(self.document_type.to_string())),
            ENTITY_KEY => self.entity.clone().map(Value::String),
            _ => self.extra.get(key).cloned(),
        }
    }
}

/// Equality filter over metadata keys. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilter {
    conditions: BTreeMap<String, Value>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key == value`.
    pub fn eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(key.into(), value.into());
        self
    }

    /// Filter on the entity tag, or match everything when `None`.
    pub fn entity(entity: Option<&str>) -> Self {
        match entity {
            Some(e) => Self::new().eq(ENTITY_KEY, e),
            None => Self::new(),
        }
    }

    /// Whether every condition holds for `metadata`.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.conditions
            .iter()
            .all(|(key, expected)| metadata.get(key).as_ref() == Some(expected))
    }
}

//! EarningsAI - Question answering over earnings calls and filings
//!
//! Upload earnings call recordings and financial documents, then ask
//! questions that are answered from the most relevant passages, with the
//! sources cited.
//!
//! # Overview
//!
//! - Audio files are transcribed by a remote speech-to-text service
//! - PDF, DOCX and text files are converted to plain text
//! - Text is embedded and stored with its metadata
//! - Questions are embedded, matched against stored records by cosine
//!   similarity, and answered by a language model
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `metadata` - Record metadata and equality filters
//! - `transcription` - Speech-to-text
//! - `extraction` - Document text extraction
//! - `embedding` - Embedding generation
//! - `store` - Document store (SQLite or in-memory)
//! - `query` - Retrieval and answer generation
//! - `orchestrator` - Upload routing and ingestion
//! - `session` - Chat history and processed files
//! - `report` - Per-file outcomes
//!
//! # Example
//!
//! ```rust,no_run
//! use earnings_ai::config::Settings;
//! use earnings_ai::orchestrator::{Orchestrator, UploadedFile};
//! use earnings_ai::session::SessionContext;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let upload = UploadedFile::from_path("report.pdf".as_ref()).await?;
//!     let report = orchestrator.process_uploads(vec![upload]).await;
//!     println!("{} files stored", report.succeeded());
//!
//!     let mut session = SessionContext::new();
//!     let answer = orchestrator.ask(&mut session, "What was Q3 revenue?").await?;
//!     println!("{}", answer.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extraction;
pub mod metadata;
pub mod openai;
pub mod orchestrator;
pub mod query;
pub mod report;
pub mod session;
pub mod store;
pub mod transcription;

pub use error::{EarningsError, Result};

//! CLI module for earnings-ai.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// earnings-ai - Question answering over earnings calls and filings
///
/// Upload call recordings and financial documents, then ask questions that are
/// answered from the most relevant passages.
#[derive(Parser, Debug)]
#[command(name = "earnings-ai")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Ingest the audio and document directories, then run the example queries
    Batch {
        /// Audio directory (default: ingest.audio_dir)
        #[arg(long)]
        audio_dir: Option<String>,

        /// Documents directory (default: ingest.documents_dir)
        #[arg(long)]
        documents_dir: Option<String>,

        /// Only ingest; don't run the example queries
        #[arg(long)]
        skip_queries: bool,
    },

    /// Upload audio recordings or documents
    Upload {
        /// Files to ingest
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Ask a question about the uploaded content
    Ask {
        /// The question to ask
        question: String,

        /// Restrict retrieval to this entity (default: ingest.entity)
        #[arg(short, long)]
        entity: Option<String>,

        /// Search all entities
        #[arg(long, conflicts_with = "entity")]
        all: bool,

        /// Number of passages to retrieve
        #[arg(short = 'n', long)]
        num_results: Option<usize>,
    },

    /// Start an interactive chat session
    Chat,

    /// Search for relevant passages without generating an answer
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// List ingested files
    List,

    /// Start HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

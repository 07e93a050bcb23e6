//! Batch command: ingest the data directories and run the example queries.

use super::connect;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::session::SessionContext;
use anyhow::Result;
use console::style;

const PREVIEW_CHARS: usize = 200;

/// Run the batch command.
pub async fn run_batch(
    audio_dir: Option<String>,
    documents_dir: Option<String>,
    skip_queries: bool,
    settings: Settings,
) -> Result<()> {
    let audio_dir = audio_dir
        .map(|d| Settings::expand_path(&d))
        .unwrap_or_else(|| settings.audio_dir());
    let documents_dir = documents_dir
        .map(|d| Settings::expand_path(&d))
        .unwrap_or_else(|| settings.documents_dir());

    let queries = settings.ingest.example_queries.clone();
    let orchestrator = connect(settings, Operation::Ingest)?;

    Output::header("Ingesting files");
    Output::kv("Audio", &audio_dir.display().to_string());
    Output::kv("Documents", &documents_dir.display().to_string());
    println!();

    let spinner = Output::spinner("Processing files...");
    let report = orchestrator.ingest_directories(&audio_dir, &documents_dir).await;
    spinner.finish_and_clear();
    Output::batch_report(&report);

    if skip_queries || queries.is_empty() {
        return Ok(());
    }

    let mut session = SessionContext::new();
    for query in &queries {
        println!("\n{} {}", style("Query:").bold(), query);

        match orchestrator.ask(&mut session, query).await {
            Ok(result) => {
                println!("{} {}", style("Response:").bold(), result.response);
                if !result.sources.is_empty() {
                    println!("\n{}", style("Sources:").bold());
                    for (i, source) in result.sources.iter().enumerate() {
                        Output::source(i + 1, source, PREVIEW_CHARS);
                    }
                }
            }
            Err(e) => Output::error(&format!("Query failed: {}", e)),
        }
    }

    Ok(())
}

//! Search command implementation.

use super::connect;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, settings: Settings) -> Result<()> {
    let orchestrator = connect(settings, Operation::Ask)?;

    let spinner = Output::spinner("Searching...");
    let results = orchestrator.search(query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(sources) if sources.is_empty() => {
            Output::warning("No results found matching your query.");
        }
        Ok(sources) => {
            Output::success(&format!("Found {} results", sources.len()));
            for (i, source) in sources.iter().enumerate() {
                Output::source(i + 1, source, 200);
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

//! Ask command implementation.

use super::connect;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    entity: Option<String>,
    all: bool,
    num_results: Option<usize>,
    settings: Settings,
) -> Result<()> {
    let entity = match (all, entity) {
        (true, _) => None,
        (false, Some(e)) => Some(e),
        (false, None) => settings.ingest.entity.clone(),
    };

    let orchestrator = connect(settings, Operation::Ask)?;
    let spinner = Output::spinner("Searching documents...");

    let result = orchestrator
        .query_interface()
        .query(question, entity.as_deref(), num_results)
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            println!("\n{}\n", result.response);

            if !result.sources.is_empty() {
                Output::header("Sources");
                for (i, source) in result.sources.iter().enumerate() {
                    Output::source(i + 1, source, 100);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

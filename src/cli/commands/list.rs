//! List command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::store::open_store;
use anyhow::Result;
use console::style;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    preflight::check(Operation::List, &settings)?;
    let store = open_store(&settings)?;

    match store.list_sources().await {
        Ok(sources) if sources.is_empty() => {
            Output::info("No files ingested yet. Use 'earnings-ai upload <files>' to add content.");
        }
        Ok(sources) => {
            Output::header(&format!("Ingested Files ({})", sources.len()));
            println!();

            for source in &sources {
                Output::list_item(&format!(
                    "{} ({}, {} record{}, {})",
                    style(&source.filename).bold(),
                    source.document_type,
                    source.record_count,
                    if source.record_count == 1 { "" } else { "s" },
                    style(source.last_ingested_at.format("%Y-%m-%d %H:%M")).dim()
                ));
            }

            println!();
            Output::kv("Total files", &sources.len().to_string());
            Output::kv("Total records", &store.document_count().await?.to_string());
        }
        Err(e) => {
            Output::error(&format!("Failed to list files: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

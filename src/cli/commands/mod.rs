//! CLI command implementations.

mod ask;
mod batch;
mod chat;
mod config;
mod doctor;
mod list;
mod search;
mod serve;
mod upload;

pub use ask::run_ask;
pub use batch::run_batch;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use list::run_list;
pub use search::run_search;
pub use serve::{router, run_serve};
pub use upload::run_upload;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;

/// Run pre-flight checks and build the orchestrator.
fn connect(settings: Settings, operation: Operation) -> anyhow::Result<Orchestrator> {
    if let Err(e) = preflight::check(operation, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'earnings-ai doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if matches!(operation, Operation::Ingest) {
        let missing = preflight::missing_tools();
        if !missing.is_empty() {
            Output::warning(&format!(
                "Not installed: {}. PDF/DOCX files that need them will fail.",
                missing.join(", ")
            ));
        }
    }

    Ok(Orchestrator::new(settings)?)
}

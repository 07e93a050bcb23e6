//! Upload command implementation.

use super::connect;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::UploadedFile;
use crate::report::{BatchReport, FileReport};
use anyhow::Result;
use std::path::Path;

/// Run the upload command.
pub async fn run_upload(files: &[String], settings: Settings) -> Result<()> {
    let orchestrator = connect(settings, Operation::Ingest)?;

    let pb = Output::progress_bar(files.len() as u64, "Uploading");
    let mut report = BatchReport::default();

    for file in files {
        let path = Path::new(file);
        pb.set_message(crate::report::file_name(path));

        match UploadedFile::from_path(path).await {
            Ok(upload) => report.extend(orchestrator.process_uploads(vec![upload]).await),
            Err(e) => report.push(FileReport::error(file.as_str(), e.to_string())),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    Output::batch_report(&report);

    if report.succeeded() == 0 {
        anyhow::bail!("No files were processed");
    }
    Ok(())
}

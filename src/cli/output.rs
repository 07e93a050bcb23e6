//! CLI output formatting utilities.

use crate::query::Source;
use crate::report::{BatchReport, FileReport, FileStatus};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print one file's ingestion outcome.
    pub fn file_report(report: &FileReport) {
        match report.status {
            FileStatus::Success => println!(
                "  {} {} {}",
                style("✓").green(),
                style(&report.filename).bold(),
                style(&report.message).dim()
            ),
            FileStatus::Skipped => println!(
                "  {} {} {}",
                style("-").yellow(),
                style(&report.filename).bold(),
                style(&report.message).dim()
            ),
            FileStatus::Error => println!(
                "  {} Error processing {}: {}",
                style("✗").red(),
                style(&report.filename).bold(),
                report.message
            ),
        }
    }

    /// Print every file in a batch plus a summary line.
    pub fn batch_report(report: &BatchReport) {
        for file in &report.files {
            Self::file_report(file);
        }
        println!();
        if report.skipped() > 0 {
            Self::info(&format!("Skipped {} already processed files", report.skipped()));
        }
        if report.failed() == 0 {
            Self::success(&format!("Processed {} files", report.succeeded()));
        } else {
            Self::warning(&format!(
                "Processed {} files, {} failed",
                report.succeeded(),
                report.failed()
            ));
        }
    }

    /// Print a source backing an answer, with a preview of its text.
    pub fn source(index: usize, source: &Source, preview_chars: usize) {
        println!(
            "\n{} {} ({}, confidence: {:.2})",
            style(format!("[{}]", index)).green(),
            style(&source.metadata.filename).bold(),
            style(source.metadata.document_type).cyan(),
            source.score
        );
        println!("   {}", content_preview(&source.text, preview_chars));
    }

    /// Create a progress bar.
    pub fn progress_bar(len: u64, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(msg.to_string());
        pb
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Flatten newlines and truncate on a char boundary.
pub fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content,
    }
}

/// Format file size in human-readable format.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

//! Interactive chat command.

use super::connect;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, UploadedFile};
use crate::report::FileReport;
use crate::session::SessionContext;
use console::style;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// A line typed at the chat prompt.
#[derive(Debug, PartialEq)]
enum ChatInput<'a> {
    Empty,
    Exit,
    Clear,
    Files,
    Upload(Vec<&'a str>),
    Question(&'a str),
}

fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return ChatInput::Exit;
    }
    match line.split_once(char::is_whitespace).unwrap_or((line, "")) {
        ("/clear", _) => ChatInput::Clear,
        ("/files", _) => ChatInput::Files,
        ("/upload", rest) => ChatInput::Upload(rest.split_whitespace().collect()),
        _ => ChatInput::Question(line),
    }
}

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> anyhow::Result<()> {
    let orchestrator = connect(settings, Operation::Ingest)?;
    let mut session = SessionContext::new();

    println!("\n{}", style("EarningsAI Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about your earnings calls and documents. Commands: /upload <files>, /files, /clear, exit").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_input(&line) {
            ChatInput::Empty => continue,
            ChatInput::Exit => {
                Output::info("Goodbye!");
                break;
            }
            ChatInput::Clear => {
                session.clear_history();
                Output::info("Conversation history cleared.");
            }
            ChatInput::Files => show_files(&session),
            ChatInput::Upload(paths) if paths.is_empty() => {
                Output::warning("Usage: /upload <file> [file...]");
            }
            ChatInput::Upload(paths) => upload(&orchestrator, &mut session, &paths).await,
            ChatInput::Question(question) => {
                let spinner = Output::spinner("Thinking...");
                let result = orchestrator.ask(&mut session, question).await;
                spinner.finish_and_clear();

                match result {
                    Ok(result) => {
                        println!("\n{} {}", style("EarningsAI:").cyan().bold(), result.response);
                        if !result.sources.is_empty() {
                            println!("\n{}", style("Sources:").dim());
                            for source in &result.sources {
                                println!(
                                    "  {} {} (confidence: {:.2})",
                                    style("*").cyan(),
                                    source.metadata.filename,
                                    source.score
                                );
                            }
                        }
                        println!();
                    }
                    Err(e) => Output::error(&format!("Error: {}", e)),
                }
            }
        }
    }

    Ok(())
}

async fn upload(orchestrator: &Orchestrator, session: &mut SessionContext, paths: &[&str]) {
    let mut uploads = Vec::new();
    for path in paths {
        match UploadedFile::from_path(Path::new(path)).await {
            Ok(upload) => uploads.push(upload),
            Err(e) => Output::file_report(&FileReport::error(*path, e.to_string())),
        }
    }
    let (uploads, mut report) = session.filter_new_uploads(uploads);
    if !uploads.is_empty() {
        let spinner = Output::spinner("Processing files...");
        let processed = orchestrator.process_uploads(uploads).await;
        spinner.finish_and_clear();

        session.record_batch(&processed);
        report.extend(processed);
    }
    if !report.files.is_empty() {
        Output::batch_report(&report);
    }
}

fn show_files(session: &SessionContext) {
    if session.processed_files.is_empty() {
        Output::info("No files processed in this session.");
        return;
    }
    Output::header("Processed Files");
    for file in &session.processed_files {
        Output::list_item(file);
    }
    println!();
}

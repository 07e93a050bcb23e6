//! Doctor command - verify system requirements and configuration.

use crate::cli::output::format_size;
use crate::cli::preflight::{check_tool, EXTRACTION_TOOLS};
use crate::cli::Output;
use crate::config::{Settings, API_KEY_ENV_VARS};
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("EarningsAI Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    let sections: [(&str, Vec<CheckResult>); 4] = [
        ("Extraction Tools", check_tools()),
        ("API Configuration", vec![check_api_key(settings)]),
        ("Directories", check_directories(settings)),
        ("Configuration", vec![check_config_file()]),
    ];

    for (title, results) in sections {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    }

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using earnings-ai.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! earnings-ai is ready to use.");
    }

    Ok(())
}

/// Extraction tools are optional: only PDF/DOCX files need them.
fn check_tools() -> Vec<CheckResult> {
    EXTRACTION_TOOLS
        .iter()
        .map(|(name, arg)| match check_tool(name, arg) {
            Ok(()) => CheckResult::ok(name, "installed"),
            Err(_) => CheckResult::warning(name, "not found", install_hint(name)),
        })
        .collect()
}

/// First and last four characters of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(4).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}

fn check_api_key(settings: &Settings) -> CheckResult {
    let name = "API key";
    match settings.api_key() {
        Ok(key) if key.chars().count() > 12 => {
            CheckResult::ok(name, &format!("configured ({})", mask_key(&key)))
        }
        Ok(_) => CheckResult::warning(
            name,
            "set but unusually short",
            "Check provider.api_key or the environment variable",
        ),
        Err(_) => CheckResult::error(
            name,
            "not set",
            &format!("Set provider.api_key or export {}", API_KEY_ENV_VARS.join(" / ")),
        ),
    }
}

fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    for (name, dir) in [
        ("Audio directory", settings.audio_dir()),
        ("Documents directory", settings.documents_dir()),
    ] {
        if dir.is_dir() {
            results.push(CheckResult::ok(name, &dir.display().to_string()));
        } else {
            results.push(CheckResult::warning(
                name,
                &format!("{} (missing)", dir.display()),
                "Only needed for the batch command",
            ));
        }
    }

    if settings.store.provider == "memory" {
        results.push(CheckResult::warning(
            "Database",
            "in-memory store",
            "Records are lost when the process exits; set store.provider = \"sqlite\"",
        ));
        return results;
    }

    let db_path = settings.sqlite_path();
    if db_path.exists() {
        let size = std::fs::metadata(&db_path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        results.push(CheckResult::ok(
            "Database",
            &format!("{} ({})", db_path.display(), size),
        ));
    } else {
        results.push(CheckResult::warning(
            "Database",
            &format!("{} (not created yet)", db_path.display()),
            "Database will be created on first upload",
        ));
    }

    results
}

fn check_config_file() -> CheckResult {
    match Settings::candidate_paths().into_iter().find(|p| p.exists()) {
        Some(path) => CheckResult::ok("Config file", &path.display().to_string()),
        None => CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: earnings-ai config init",
        ),
    }
}

fn install_hint(tool: &str) -> &'static str {
    match (tool, cfg!(target_os = "macos")) {
        ("pandoc", true) => "Install with: brew install pandoc",
        ("pandoc", false) => "Install with: sudo apt install pandoc (or your package manager)",
        (_, true) => "Install with: brew install poppler",
        (_, false) => "Install with: sudo apt install poppler-utils (or your package manager)",
    }
}

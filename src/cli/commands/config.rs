//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let mut shown = settings;
            if shown.provider.api_key.is_some() {
                shown.provider.api_key = Some("********".to_string());
            }
            let toml_str = toml::to_string_pretty(&shown)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            match Settings::candidate_paths().into_iter().find(|p| p.exists()) {
                Some(path) => println!("{}", path.display()),
                None => {
                    println!("{}", Settings::default_config_path().display());
                    Output::info("No config file found; using defaults.");
                }
            }
        }

        ConfigAction::Init { force } => {
            let config_path = Settings::default_config_path();
            if config_path.exists() && !force {
                Output::warning(&format!(
                    "Config already exists at {} (use --force to overwrite)",
                    config_path.display()
                ));
                return Ok(());
            }

            Settings::default().save_to(&config_path)?;
            Output::success(&format!("Wrote default config to {}", config_path.display()));
        }
    }

    Ok(())
}

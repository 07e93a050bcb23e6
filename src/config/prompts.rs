//! Prompt templates for earnings-ai.
//!
//! Prompts can be customized by placing a `query.toml` file in the custom
//! prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub query: QueryPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}


/// Prompts for answering questions over retrieved passages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryPrompts {
    pub system: String,
    pub user: String,
}

impl Default for QueryPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a financial analyst assistant that answers questions about company earnings using excerpts from earnings call transcripts and filings.

Guidelines:
- Answer using only the provided excerpts
- Quote figures exactly as they appear in the excerpts
- Cite sources by their bracketed number and filename, e.g. [1] report.pdf
- If the excerpts don't contain the answer, say so clearly
- Be concise but complete"#
                .to_string(),

            user: r#"Relevant excerpts:

{{context}}

Question: {{question}}

Answer the question based on the excerpts above."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let query_path = PathBuf::from(shellexpand::tilde(dir).to_string()).join("query.toml");
            if query_path.exists() {
                let content = std::fs::read_to_string(&query_path)?;
                prompts.query = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

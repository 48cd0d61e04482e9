//! Prompt templates for the router and summarizer.
//!
//! Templates are plain text with `{{key}}` placeholders, loaded from the
//! prompts directory (`config/prompts/` by default). A missing file falls
//! back to the built-in text, which mirrors the shipped files, so the
//! service runs without a `config/` tree.
//!
//! ```text
//! router.txt   — {{question}}, {{apis}}
//! summary.txt  — {{question}}, {{data}}
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

pub const ROUTER_FILE: &str = "router.txt";
pub const SUMMARY_FILE: &str = "summary.txt";

const ROUTER_BUILTIN: &str = r#"You are an API orchestrator.
User asked: "{{question}}"

Available APIs:
{{apis}}

Which APIs are required?
Return ONLY a JSON array of API names, like: ["OrderAPI", "PaymentAPI"]"#;

const SUMMARY_BUILTIN: &str = r#"The user asked: "{{question}}"

Here is the raw API data:
{{data}}

Your job:
- Summarize this data into a clear, conversational answer.
- DO NOT include raw JSON in your response.
- Speak like a helpful assistant explaining results to a human.
- If there are multiple APIs, combine the info naturally in one answer.
- Example: Instead of showing raw JSON, say something like:
  "The order #12345 was placed on Sept 10 for an X-ray Scan. Payment of $199.99 has already been received.""#;

/// Router and summarizer templates, read once at startup.
#[derive(Debug, Clone)]
pub struct PromptSet {
    router: String,
    summary: String,
}

impl PromptSet {
    /// Load both templates from `dir`, using the built-ins for missing files.
    pub fn load(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            router: read_or(dir, ROUTER_FILE, ROUTER_BUILTIN),
            summary: read_or(dir, SUMMARY_FILE, SUMMARY_BUILTIN),
        }
    }

    pub fn builtin() -> Self {
        Self {
            router: ROUTER_BUILTIN.to_string(),
            summary: SUMMARY_BUILTIN.to_string(),
        }
    }

    /// Routing prompt: the question plus the registry menu.
    pub fn router(&self, question: &str, apis: &str) -> String {
        PromptBuilder::new(&self.router)
            .var("question", question)
            .var("apis", apis)
            .build()
    }

    /// Summary prompt: the question plus the pretty-printed aggregated data.
    pub fn summary(&self, question: &str, data: &str) -> String {
        PromptBuilder::new(&self.summary)
            .var("question", question)
            .var("data", data)
            .build()
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::builtin()
    }
}

fn read_or(dir: &Path, file: &str, builtin: &str) -> String {
    let path: PathBuf = dir.join(file);
    match fs::read_to_string(&path) {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => {
            debug!("prompt: '{}' not found — using built-in", path.display());
            builtin.to_string()
        }
    }
}

/// Applies `{{key}}` → value substitution to a template.
///
/// All placeholders are replaced in one pass over the template, so a value
/// that itself contains `{{...}}` (user input, API data) is never expanded.
pub struct PromptBuilder<'a> {
    template: &'a str,
    vars: HashMap<&'a str, &'a str>,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(template: &'a str) -> Self {
        Self { template, vars: HashMap::new() }
    }

    pub fn var(mut self, key: &'a str, value: &'a str) -> Self {
        self.vars.insert(key, value);
        self
    }

    /// Unknown placeholders are left as-is.
    pub fn build(self) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = &after[..end];
                    match self.vars.get(key) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push_str("{{");
                            out.push_str(key);
                            out.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

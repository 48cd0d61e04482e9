//! API selection — asks the language model which registry entries a
//! question needs.
//!
//! Selection never fails the request: an LLM error or an unreadable reply
//! degrades to an empty selection, and the pipeline carries on with no
//! downstream data.

use serde_json::Value;
use tracing::{debug, warn};

use crate::llm::LlmProvider;
use crate::prompt::PromptSet;
use crate::registry::ApiRegistry;

/// Ask `provider` which APIs answer `question`. Names are returned as the
/// model gave them; the registry drops unknown ones at dispatch time.
pub async fn choose_apis(
    provider: &LlmProvider,
    prompts: &PromptSet,
    registry: &ApiRegistry,
    question: &str,
    temperature: f32,
) -> Vec<String> {
    let prompt = prompts.router(question, &registry.menu());

    match provider.complete(&prompt, temperature).await {
        Ok(reply) => {
            let selection = parse_selection(&reply);
            debug!(?selection, reply_len = reply.len(), "router selection");
            selection
        }
        Err(e) => {
            warn!(error = %e, "router LLM call failed — no APIs selected");
            Vec::new()
        }
    }
}

/// Read a JSON array of names out of a model reply.
///
/// Tries the whole reply first, then the span from the first `[` to the last
/// `]`, then gives up with an empty list. Non-string array elements are
/// ignored.
pub fn parse_selection(reply: &str) -> Vec<String> {
    let reply = reply.trim();
    if let Some(names) = parse_array(reply) {
        return names;
    }

    let (Some(start), Some(end)) = (reply.find('['), reply.rfind(']')) else {
        debug!("router reply has no JSON array");
        return Vec::new();
    };
    if end < start {
        return Vec::new();
    }
    parse_array(&reply[start..=end]).unwrap_or_else(|| {
        debug!("router reply array did not parse");
        Vec::new()
    })
}

fn parse_array(text: &str) -> Option<Vec<String>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    }
}

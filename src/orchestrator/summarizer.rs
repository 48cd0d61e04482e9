//! Turns the aggregated API data into one conversational answer.

use tracing::debug;

use crate::llm::{LlmProvider, ProviderError};
use crate::prompt::PromptSet;

use super::fetcher::Aggregated;

/// Answer used when the summary call fails and fallback is enabled.
pub const FALLBACK_ANSWER: &str =
    "I retrieved the requested information but could not summarize it right now.";

/// Ask `provider` to rephrase `data` as an answer to `question`.
///
/// Called even when `data` is empty, so the model can say nothing was found.
pub async fn summarize(
    provider: &LlmProvider,
    prompts: &PromptSet,
    question: &str,
    data: &Aggregated,
    temperature: f32,
) -> Result<String, ProviderError> {
    let pretty = serde_json::to_string_pretty(data)
        .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
    let prompt = prompts.summary(question, &pretty);

    let answer = provider.complete(&prompt, temperature).await?;
    debug!(answer_len = answer.len(), apis = data.len(), "summary ready");
    Ok(answer)
}

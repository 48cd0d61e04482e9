//! LLM provider implementations.
//!
//! `build(config, api_key)` is the factory — called once at startup.

pub mod dummy;
#[cfg(feature = "provider-openai")]
pub mod openai_compatible;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct a `LlmProvider` from config and an optional API key.
///
/// `api_key` is sourced from `OPENAI_API_KEY` (never TOML). A missing key is
/// not an error here; the provider's first request will fail instead.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(match &config.dummy_reply {
            Some(reply) => dummy::DummyProvider::fixed(reply.as_str()),
            None => dummy::DummyProvider::echo(),
        })),
        #[cfg(feature = "provider-openai")]
        "openai" | "openai-compatible" => {
            let oai = &config.openai;
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                oai.api_base_url.clone(),
                oai.model.clone(),
                oai.timeout_seconds,
                api_key,
            )?;
            Ok(LlmProvider::OpenAiCompatible(p))
        }
        _ => {
            let _ = api_key;
            Err(ProviderError::UnknownProvider(config.provider.clone()))
        }
    }
}

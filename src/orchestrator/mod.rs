//! The chat pipeline: select → fetch (parallel) → aggregate → summarize.
//!
//! [`Orchestrator`] owns everything a request needs (LLM provider, registry,
//! prompts, fetch settings), built once at startup and shared behind an
//! `Arc`. Nothing in it is mutated per request.

pub mod fetcher;
pub mod router;
pub mod summarizer;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::config::{Config, SummarizerConfig};
use crate::error::AppError;
use crate::llm::{LlmProvider, ProviderError, providers};
use crate::prompt::PromptSet;
use crate::registry::ApiRegistry;

pub use fetcher::{Aggregated, Fetcher};

/// Successful `/chat` reply.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub data: Aggregated,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("summarizer failed: {0}")]
    Summarizer(#[source] ProviderError),
}

pub struct Orchestrator {
    provider: LlmProvider,
    registry: Arc<ApiRegistry>,
    prompts: PromptSet,
    fetcher: Fetcher,
    router_temperature: f32,
    summarizer: SummarizerConfig,
    default_subject_id: String,
}

impl Orchestrator {
    pub fn new(
        provider: LlmProvider,
        registry: Arc<ApiRegistry>,
        prompts: PromptSet,
        fetcher: Fetcher,
        router_temperature: f32,
        summarizer: SummarizerConfig,
        default_subject_id: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            registry,
            prompts,
            fetcher,
            router_temperature,
            summarizer,
            default_subject_id: default_subject_id.into(),
        }
    }

    /// Build the provider, registry and prompts from a resolved [`Config`].
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let provider = providers::build(&config.llm, config.llm_api_key.clone())?;
        Ok(Self::new(
            provider,
            Arc::new(ApiRegistry::new(config.apis.clone())),
            PromptSet::load(&config.prompts_dir),
            Fetcher::from_config(&config.fetch),
            config.router.temperature,
            config.summarizer.clone(),
            config.fetch.default_subject_id.clone(),
        ))
    }

    pub fn registry(&self) -> &ApiRegistry {
        &self.registry
    }

    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Identifier used when a request names none.
    pub fn default_subject_id(&self) -> &str {
        &self.default_subject_id
    }

    /// Answer `question` for `subject_id`.
    ///
    /// Only the summary step can fail, and only when fallback is disabled.
    pub async fn handle(&self, question: &str, subject_id: &str) -> Result<ChatResponse, ChatError> {
        let selection = router::choose_apis(
            &self.provider,
            &self.prompts,
            &self.registry,
            question,
            self.router_temperature,
        )
        .await;

        let entries = self.registry.select(&selection);
        info!(selected = ?selection, dispatched = entries.len(), "apis chosen");

        let data = self.fetcher.fetch_all(&entries, subject_id).await;

        match summarizer::summarize(
            &self.provider,
            &self.prompts,
            question,
            &data,
            self.summarizer.temperature,
        )
        .await
        {
            Ok(answer) => Ok(ChatResponse { answer, data }),
            Err(e) if self.summarizer.fallback_on_error => {
                error!(error = %e, "summarizer failed — returning raw data");
                Ok(ChatResponse { answer: summarizer::FALLBACK_ANSWER.to_string(), data })
            }
            Err(e) => {
                error!(error = %e, "summarizer failed");
                Err(ChatError::Summarizer(e))
            }
        }
    }
}

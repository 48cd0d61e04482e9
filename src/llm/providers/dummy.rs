//! Offline provider for keyless local runs and tests.
//!
//! With no canned reply it echoes the prompt back prefixed with `[echo]`.
//! With a canned reply (`[llm.dummy] reply = "..."`) every call returns that
//! text, which lets a run pin the router's selection, e.g.
//! `reply = '["OrderAPI", "PaymentAPI"]'`.

use std::sync::Arc;

use crate::llm::ProviderError;

#[derive(Debug, Clone, Default)]
pub struct DummyProvider {
    reply: Option<Arc<str>>,
}

impl DummyProvider {
    pub fn echo() -> Self {
        Self { reply: None }
    }

    pub fn fixed(reply: impl Into<Arc<str>>) -> Self {
        Self { reply: Some(reply.into()) }
    }

    pub async fn complete(&self, content: &str) -> Result<String, ProviderError> {
        Ok(match &self.reply {
            Some(reply) => reply.to_string(),
            None => format!("[echo] {content}"),
        })
    }
}

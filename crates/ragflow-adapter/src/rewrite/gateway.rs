//! Fail-soft wrapper around the completion capability.

use std::sync::Arc;

use crate::llm::CompletionProvider;

/// Single entry point for every completion call the engine makes.
///
/// Rewriting is a best-effort enhancement, never a hard dependency for
/// answering a query, so the gateway never propagates provider errors:
/// any failure (call error, missing or empty completion) surfaces as an
/// empty string and is recorded in the log.
#[derive(Clone)]
pub struct CompletionGateway {
    provider: Arc<dyn CompletionProvider>,
}

impl CompletionGateway {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    pub async fn complete(&self, prompt: &str) -> String {
        tracing::debug!(prompt = %prompt, "Sending prompt to completion provider");
        match self.provider.text_complete(prompt).await {
            Ok(response) => {
                let text = response.completion_text.trim().to_string();
                tracing::debug!(raw = %text, "Raw completion received");
                text
            }
            Err(e) => {
                tracing::error!(error = %e, "Completion provider call failed");
                String::new()
            }
        }
    }
}

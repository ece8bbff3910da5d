//! Completion provider abstraction.
//!
//! The adapter treats the language model as an opaque text-in/text-out
//! capability. Anything that can turn a prompt into a completion can drive
//! query rewriting; `ExternalProvider` is the HTTP implementation for
//! OpenAI-compatible endpoints.

use anyhow::Result;
use async_trait::async_trait;

pub mod external;

pub use external::ExternalProvider;

/// A single completion exchanged with the model. One request, one response;
/// no streaming and no retries at this layer.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub completion_text: String,
}

/// Text-completion capability consumed by the rewrite engine.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn text_complete(&self, prompt: &str) -> Result<CompletionResponse>;
}

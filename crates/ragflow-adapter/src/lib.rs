//! RAGFlow query adapter.
//!
//! Sits between a chat-bot host and a RAGFlow retrieval service. For each
//! outgoing model request the adapter can rewrite the user's query into a
//! retrieval-friendly form, fetch relevant passages from RAGFlow, and inject
//! the retrieved text into the request before it reaches the language model.
//! Rewriting is best-effort throughout: a failed model call or an
//! unparseable response degrades toward "use the original query", never
//! toward an error out of the pipeline.

pub mod archive;
pub mod config;
pub mod inject;
pub mod llm;
pub mod pipeline;
pub mod retrieval;
pub mod rewrite;

// Re-export primary types for convenience
pub use config::{AdapterConfig, ConfigError, RewriteProviderConfig};
pub use inject::{inject_content, ContextMessage, InjectionMethod, ProviderRequest};
pub use llm::{CompletionProvider, CompletionResponse, ExternalProvider};
pub use pipeline::RagflowAdapter;
pub use retrieval::RetrievalClient;
pub use rewrite::{
    DetectionResult, QueryCategory, QueryRewriteManager, RewriteOutcome,
};

// Re-export common types
pub use anyhow::{Error, Result};

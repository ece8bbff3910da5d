use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::inject::InjectionMethod;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Base URL of the RAGFlow deployment, e.g. "https://ragflow.local".
    pub ragflow_base_url: String,
    pub ragflow_api_key: String,
    /// Dataset (knowledge base) ids searched on every retrieval call.
    pub ragflow_kb_ids: Vec<String>,
    pub top_k: usize,
    pub similarity_threshold: f32,
    pub enable_query_rewrite: bool,
    /// Completion endpoint used for query rewriting. Optional: rewriting is
    /// skipped with a warning when enabled without a provider.
    pub rewrite_provider: Option<RewriteProviderConfig>,
    pub rag_injection_method: InjectionMethod,
    /// Archive the session's recent history every N messages; 0 disables.
    pub rag_archive_threshold: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteProviderConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> usize {
    512
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            ragflow_base_url: String::new(),
            ragflow_api_key: String::new(),
            ragflow_kb_ids: Vec::new(),
            top_k: 5,
            similarity_threshold: 0.35,
            enable_query_rewrite: false,
            rewrite_provider: None,
            rag_injection_method: InjectionMethod::SystemPrompt,
            rag_archive_threshold: 0,
        }
    }
}

impl AdapterConfig {
    /// Validate config values, returning errors for clearly broken
    /// configurations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::Invalid(
                "similarity_threshold must be in [0.0, 1.0]".into(),
            ));
        }
        if let Some(provider) = &self.rewrite_provider {
            if provider.endpoint.is_empty() {
                return Err(ConfigError::Invalid(
                    "rewrite_provider.endpoint must not be empty".into(),
                ));
            }
            if provider.model.is_empty() {
                return Err(ConfigError::Invalid(
                    "rewrite_provider.model must not be empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing
    /// fields.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// True when every field the retrieval call needs is present.
    pub fn is_retrieval_configured(&self) -> bool {
        !self.ragflow_base_url.is_empty()
            && !self.ragflow_api_key.is_empty()
            && !self.ragflow_kb_ids.is_empty()
    }

    /// Log the effective configuration at startup with secrets masked.
    pub fn log_summary(&self) {
        tracing::info!(base_url = %self.ragflow_base_url, "RAGFlow adapter configured");
        tracing::info!(api_key = %mask_sensitive(&self.ragflow_api_key), "RAGFlow API key");
        let masked_kb_ids: Vec<String> =
            self.ragflow_kb_ids.iter().map(|id| mask_sensitive(id)).collect();
        tracing::info!(kb_ids = ?masked_kb_ids, "RAGFlow knowledge bases");
        tracing::info!(
            enabled = self.enable_query_rewrite,
            provider = self
                .rewrite_provider
                .as_ref()
                .map(|p| p.model.as_str())
                .unwrap_or("unset"),
            "Query rewriting"
        );
        tracing::info!(
            method = ?self.rag_injection_method,
            archive_threshold = self.rag_archive_threshold,
            "Injection and archiving"
        );
    }
}

/// Mask a credential for logging, keeping only the last 6 characters.
pub fn mask_sensitive(info: &str) -> String {
    let chars: Vec<char> = info.chars().collect();
    if chars.len() <= 6 {
        return info.to_string();
    }
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("******{tail}")
}

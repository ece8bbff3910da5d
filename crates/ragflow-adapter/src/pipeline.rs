//! Adapter pipeline: rewrite, retrieve, inject, archive.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;

use crate::{
    archive::{archive_recent, SessionCounter},
    config::AdapterConfig,
    inject::{inject_content, ContextMessage, ProviderRequest},
    llm::CompletionProvider,
    retrieval::RetrievalClient,
    rewrite::{QueryRewriteManager, RewriteOutcome},
};

/// The full adapter, wired once at startup and shared across sessions.
pub struct RagflowAdapter {
    config: AdapterConfig,
    retrieval: RetrievalClient,
    rewriter: Option<QueryRewriteManager>,
    sessions: SessionCounter,
}

impl RagflowAdapter {
    /// Build the adapter from validated config. `provider` is the
    /// completion capability used for rewriting; rewriting is skipped with
    /// a warning when enabled but no provider is supplied.
    pub fn new(
        config: AdapterConfig,
        provider: Option<Arc<dyn CompletionProvider>>,
    ) -> Result<Self> {
        config.validate()?;
        config.log_summary();

        let retrieval = RetrievalClient::new(&config)?;

        let rewriter = if config.enable_query_rewrite {
            match provider {
                Some(provider) => Some(QueryRewriteManager::new(provider)),
                None => {
                    tracing::warn!(
                        "Query rewriting is enabled but no completion provider is configured, skipping rewrites"
                    );
                    None
                }
            }
        } else {
            None
        };

        let sessions = SessionCounter::new(config.rag_archive_threshold);

        Ok(Self {
            config,
            retrieval,
            rewriter,
            sessions,
        })
    }

    /// Rewrite a query, or pass it through when rewriting is disabled.
    pub async fn rewrite(&self, query: &str, history: &str) -> RewriteOutcome {
        match &self.rewriter {
            Some(manager) => manager.rewrite_query(query, history).await,
            None => RewriteOutcome::Single(query.to_string()),
        }
    }

    /// Retrieve reference text for a rewrite outcome. A decomposed outcome
    /// issues one retrieval call per sub-query, concurrently, and joins the
    /// non-empty results.
    pub async fn retrieve_for(&self, outcome: &RewriteOutcome) -> String {
        match outcome {
            RewriteOutcome::Single(query) => self.retrieval.retrieve(query).await,
            RewriteOutcome::Decomposed(sub_queries) => {
                let results =
                    join_all(sub_queries.iter().map(|q| self.retrieval.retrieve(q))).await;
                results
                    .into_iter()
                    .filter(|content| !content.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n\n")
            }
        }
    }

    /// Process one outgoing model request in place: rewrite the latest user
    /// message, retrieve reference passages, inject them, and bump the
    /// session counter (archiving when the threshold is crossed). Degraded
    /// sub-steps leave the request untouched rather than failing it.
    pub async fn process_request(
        &self,
        req: &mut ProviderRequest,
        session_id: &str,
        history: &[ContextMessage],
    ) {
        let query = req.prompt.clone();
        let history_text = format_history(history);

        let outcome = self.rewrite(&query, &history_text).await;
        let content = self.retrieve_for(&outcome).await;
        inject_content(req, self.config.rag_injection_method, &content);

        let (count, should_archive) = self.sessions.bump(session_id);
        tracing::debug!(session = %session_id, count, "Session message recorded");
        if should_archive {
            let record =
                archive_recent(session_id, history, self.config.rag_archive_threshold as usize);
            tracing::info!(
                session = %session_id,
                messages = record.messages.len(),
                at = %record.archived_at,
                "Conversation archived"
            );
        }
    }
}

/// Flatten prior turns into the plain-text history the rewrite prompts
/// expect. The engine imposes no schema on this text.
fn format_history(history: &[ContextMessage]) -> String {
    history
        .iter()
        .map(|msg| format!("{}: {}", msg.role, msg.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionProvider, CompletionResponse};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedProvider {
        script: Mutex<VecDeque<Option<String>>>,
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn text_complete(&self, _prompt: &str) -> Result<CompletionResponse> {
            match self.script.lock().unwrap().pop_front().flatten() {
                Some(text) => Ok(CompletionResponse {
                    completion_text: text,
                }),
                None => Err(anyhow!("provider unavailable")),
            }
        }
    }

    fn provider_with(script: Vec<Option<&str>>) -> Arc<dyn CompletionProvider> {
        Arc::new(ScriptedProvider {
            script: Mutex::new(script.into_iter().map(|s| s.map(String::from)).collect()),
        })
    }

    fn rewrite_enabled_config() -> AdapterConfig {
        AdapterConfig {
            enable_query_rewrite: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_format_history() {
        let history = vec![
            ContextMessage::new("user", "差旅费怎么报？"),
            ContextMessage::new("assistant", "请参考制度文件。"),
        ];
        assert_eq!(
            format_history(&history),
            "user: 差旅费怎么报？\nassistant: 请参考制度文件。"
        );
    }

    #[tokio::test]
    async fn test_rewrite_disabled_passes_query_through() {
        let adapter = RagflowAdapter::new(AdapterConfig::default(), None).unwrap();
        let outcome = adapter.rewrite("原始问题", "").await;
        assert_eq!(outcome, RewriteOutcome::Single("原始问题".to_string()));
    }

    #[tokio::test]
    async fn test_rewrite_enabled_without_provider_passes_query_through() {
        let adapter = RagflowAdapter::new(rewrite_enabled_config(), None).unwrap();
        let outcome = adapter.rewrite("原始问题", "").await;
        assert_eq!(outcome, RewriteOutcome::Single("原始问题".to_string()));
    }

    #[tokio::test]
    async fn test_rewrite_enabled_uses_manager() {
        let provider = provider_with(vec![
            Some(r#"{"query_type": "上下文依赖型", "confidence": 0.8}"#),
            Some("公司最新差旅费用报销政策"),
        ]);
        let adapter = RagflowAdapter::new(rewrite_enabled_config(), Some(provider)).unwrap();
        let outcome = adapter
            .rewrite("那个报销政策是怎样的？", "用户之前问过差旅费用规定")
            .await;
        assert_eq!(
            outcome,
            RewriteOutcome::Single("公司最新差旅费用报销政策".to_string())
        );
    }

    #[tokio::test]
    async fn test_process_request_degrades_without_ragflow() {
        // No RAGFlow configured: retrieval yields nothing, the request
        // passes through unchanged apart from session bookkeeping.
        let adapter = RagflowAdapter::new(AdapterConfig::default(), None).unwrap();
        let mut req = ProviderRequest {
            prompt: "问题".to_string(),
            ..Default::default()
        };
        let before = req.clone();
        adapter.process_request(&mut req, "session-1", &[]).await;
        assert_eq!(req, before);
    }

    #[tokio::test]
    async fn test_retrieve_for_decomposed_skips_unconfigured_calls() {
        let adapter = RagflowAdapter::new(AdapterConfig::default(), None).unwrap();
        let outcome =
            RewriteOutcome::Decomposed(vec!["问题一".to_string(), "问题二".to_string()]);
        assert_eq!(adapter.retrieve_for(&outcome).await, "");
    }
}

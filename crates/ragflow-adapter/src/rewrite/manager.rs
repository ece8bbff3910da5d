//! Rewrite dispatch.

use std::sync::Arc;

use crate::llm::CompletionProvider;

use super::{
    detector::QueryTypeDetector,
    gateway::CompletionGateway,
    strategies::{
        AmbiguousReferenceRewriter, ComparativeRewriter, ContextDependentRewriter,
        MultiIntentRewriter, RhetoricalRewriter,
    },
    QueryCategory, RewriteOutcome,
};

/// Coordinates the type detector and the strategy rewriters.
///
/// Stateless across calls: the only shared piece is the provider handle, so
/// concurrent `rewrite_query` calls do not interfere. Within one call the
/// two completion requests (detect, then rewrite) run sequentially.
pub struct QueryRewriteManager {
    detector: QueryTypeDetector,
    context_rewriter: ContextDependentRewriter,
    comparative_rewriter: ComparativeRewriter,
    ambiguous_rewriter: AmbiguousReferenceRewriter,
    multi_intent_rewriter: MultiIntentRewriter,
    rhetorical_rewriter: RhetoricalRewriter,
}

impl QueryRewriteManager {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        let gateway = CompletionGateway::new(provider);
        Self {
            detector: QueryTypeDetector::new(gateway.clone()),
            context_rewriter: ContextDependentRewriter::new(gateway.clone()),
            comparative_rewriter: ComparativeRewriter::new(gateway.clone()),
            ambiguous_rewriter: AmbiguousReferenceRewriter::new(gateway.clone()),
            multi_intent_rewriter: MultiIntentRewriter::new(gateway.clone()),
            rhetorical_rewriter: RhetoricalRewriter::new(gateway),
        }
    }

    /// Detect the query's type and dispatch to the matching strategy.
    ///
    /// A `Plain` or unrecognized category returns the query unchanged;
    /// callers must treat a same-as-input result as "rewriting was not
    /// needed", not as an error signal.
    pub async fn rewrite_query(&self, query: &str, history: &str) -> RewriteOutcome {
        let detection = self.detector.detect(query, history, "").await;
        tracing::info!(
            query = %query,
            label = %detection.label,
            category = ?detection.category,
            confidence = detection.confidence,
            "Dispatching query rewrite"
        );

        let outcome = match detection.category {
            QueryCategory::ContextDependent => {
                RewriteOutcome::Single(self.context_rewriter.rewrite(query, history).await)
            }
            QueryCategory::Comparative => {
                RewriteOutcome::Single(self.comparative_rewriter.rewrite(query, history).await)
            }
            QueryCategory::MultiIntent => {
                RewriteOutcome::Decomposed(self.multi_intent_rewriter.rewrite(query).await)
            }
            QueryCategory::AmbiguousReference => {
                RewriteOutcome::Single(self.ambiguous_rewriter.rewrite(query, history).await)
            }
            QueryCategory::Rhetorical => {
                RewriteOutcome::Single(self.rhetorical_rewriter.rewrite(query, history).await)
            }
            QueryCategory::Plain => RewriteOutcome::Single(query.to_string()),
        };

        tracing::info!(outcome = ?outcome, "Rewrite finished");
        outcome
    }
}

//! Query-rewrite classification and dispatch engine.
//!
//! Detects the rhetorical/semantic type of an incoming query with a single
//! LLM call, then routes it to a specialized rewriting strategy. The model's
//! output is treated as untrusted, semi-structured text: category labels are
//! matched by substring, structured payloads go through the tolerant salvage
//! parser, and every failure degrades to "use the original query".

pub mod detector;
pub mod gateway;
pub mod manager;
pub mod salvage;
pub mod strategies;

pub use detector::QueryTypeDetector;
pub use gateway::CompletionGateway;
pub use manager::QueryRewriteManager;
pub use strategies::{
    AmbiguousReferenceRewriter, ComparativeRewriter, ContextDependentRewriter,
    MultiIntentRewriter, RhetoricalRewriter,
};

/// Closed set of query types the detector can resolve a label to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryCategory {
    /// Depends on earlier turns ("还有其他的吗？")
    ContextDependent,
    /// Compares two or more entities ("哪个更好")
    Comparative,
    /// Contains unresolved pronouns/demonstratives ("它是什么")
    AmbiguousReference,
    /// Bundles several independent questions in one message
    MultiIntent,
    /// Rhetorical or emotionally loaded statement
    Rhetorical,
    /// Regular self-contained question; never rewritten
    Plain,
}

/// Label markers checked in priority order. MultiIntent sits before
/// AmbiguousReference so a label carrying both markers dispatches to the
/// multi-intent strategy, matching the priority rule the detector prompt
/// states. The model is not trusted to honor that rule on its own.
const LABEL_RULES: &[(&[&str], QueryCategory)] = &[
    (&["上下文依赖", "context"], QueryCategory::ContextDependent),
    (&["对比", "比较", "compar"], QueryCategory::Comparative),
    (&["多意图", "multi"], QueryCategory::MultiIntent),
    (
        &["模糊指代", "指代", "ambiguous"],
        QueryCategory::AmbiguousReference,
    ),
    (&["反问", "rhetorical"], QueryCategory::Rhetorical),
];

impl QueryCategory {
    /// Resolve a model-produced type label to a category.
    ///
    /// Labels are matched by substring containment so verbose or slightly
    /// malformed output ("对比型疑问句") still dispatches correctly. Anything
    /// that matches no rule is `Plain`.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.to_lowercase();
        for (markers, category) in LABEL_RULES {
            if markers.iter().any(|m| normalized.contains(m)) {
                return *category;
            }
        }
        QueryCategory::Plain
    }
}

/// Outcome of query-type detection. Confidence is advisory only; it is
/// logged but never gates dispatch.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub category: QueryCategory,
    /// Raw label text the model produced, kept for logging.
    pub label: String,
    pub confidence: f32,
}

impl DetectionResult {
    /// Default returned whenever detection output cannot be used.
    pub fn fallback() -> Self {
        Self {
            category: QueryCategory::Plain,
            label: "普通型".to_string(),
            confidence: 0.5,
        }
    }
}

/// Result of a rewrite. Callers must distinguish the variants: `Single`
/// feeds one retrieval call, `Decomposed` one per sub-query. Only the
/// multi-intent path produces `Decomposed`.
#[derive(Debug, Clone, PartialEq)]
pub enum RewriteOutcome {
    Single(String),
    Decomposed(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_chinese_labels() {
        assert_eq!(
            QueryCategory::from_label("上下文依赖型"),
            QueryCategory::ContextDependent
        );
        assert_eq!(QueryCategory::from_label("对比型"), QueryCategory::Comparative);
        assert_eq!(
            QueryCategory::from_label("模糊指代型"),
            QueryCategory::AmbiguousReference
        );
        assert_eq!(QueryCategory::from_label("多意图型"), QueryCategory::MultiIntent);
        assert_eq!(QueryCategory::from_label("反问型"), QueryCategory::Rhetorical);
        assert_eq!(QueryCategory::from_label("普通型"), QueryCategory::Plain);
    }

    #[test]
    fn test_verbose_label_matches_by_substring() {
        assert_eq!(
            QueryCategory::from_label("对比型疑问句"),
            QueryCategory::Comparative
        );
        assert_eq!(
            QueryCategory::from_label("这是一个上下文依赖的问题"),
            QueryCategory::ContextDependent
        );
    }

    #[test]
    fn test_english_labels() {
        assert_eq!(
            QueryCategory::from_label("Multi-Intent"),
            QueryCategory::MultiIntent
        );
        assert_eq!(
            QueryCategory::from_label("Comparative question"),
            QueryCategory::Comparative
        );
        assert_eq!(
            QueryCategory::from_label("ambiguous reference"),
            QueryCategory::AmbiguousReference
        );
    }

    #[test]
    fn test_multi_intent_beats_ambiguous_reference() {
        // A label carrying both markers must resolve to MultiIntent.
        assert_eq!(
            QueryCategory::from_label("多意图型，兼有模糊指代"),
            QueryCategory::MultiIntent
        );
        assert_eq!(
            QueryCategory::from_label("ambiguous multi-intent"),
            QueryCategory::MultiIntent
        );
    }

    #[test]
    fn test_unknown_label_defaults_to_plain() {
        assert_eq!(QueryCategory::from_label(""), QueryCategory::Plain);
        assert_eq!(QueryCategory::from_label("胡言乱语"), QueryCategory::Plain);
    }
}

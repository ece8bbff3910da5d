//! Strategy rewriters.
//!
//! Five independent strategies sharing one shape: a fixed instruction block
//! concatenated with the caller's fields into a single prompt, delegated to
//! the gateway, light post-processing on the way out. No strategy
//! second-guesses the semantic quality of the model's answer.
//!
//! Degradation: a string-producing strategy whose completion comes back
//! empty returns the original query unchanged. The multi-intent strategy
//! wraps an unparseable completion in a single-element vec verbatim, which
//! makes `[""]` the multi-intent outcome under total provider failure.

use super::{gateway::CompletionGateway, salvage};

const CONTEXT_DEPENDENT_INSTRUCTION: &str = "\
你是一个智能的查询优化助手。请分析用户的当前问题以及前序对话历史，判断当前问题是否依赖于上下文。
如果依赖，请将当前问题改写成一个独立的、包含所有必要上下文信息的完整问题。
如果不依赖，直接返回原问题。";

const COMPARATIVE_INSTRUCTION: &str = "\
你是一个查询分析专家。请分析用户的输入和相关的对话上下文，识别出问题中需要进行比较的多个对象。
然后，将原始问题改写成一个更明确、更适合在知识库中检索的对比性查询。";

const AMBIGUOUS_REFERENCE_INSTRUCTION: &str = "\
你是一个消除语言歧义的专家。请分析用户的当前问题和对话历史，找出问题中 \"都\"、\"它\"、\"这个\" 等模糊指代词具体指向的对象。
然后，将这些指代词替换为明确的对象名称，生成一个清晰、无歧义的新问题。";

const MULTI_INTENT_INSTRUCTION: &str = "\
你是一个任务分解机器人。请将用户的复杂问题分解成多个独立的、可以单独回答的简单问题。以JSON数组格式输出。";

const RHETORICAL_INSTRUCTION: &str = "\
你是一个沟通理解大师。请分析用户的反问或带有情绪的陈述，识别其背后真实的意图和问题。
然后，将这个反问改写成一个中立、客观、可以直接用于知识库检索的问题。";

/// Rewrites a context-dependent question into a self-contained one.
pub struct ContextDependentRewriter {
    gateway: CompletionGateway,
}

impl ContextDependentRewriter {
    pub fn new(gateway: CompletionGateway) -> Self {
        Self { gateway }
    }

    pub async fn rewrite(&self, query: &str, history: &str) -> String {
        let prompt = format!(
            "### 指令 ###\n{CONTEXT_DEPENDENT_INSTRUCTION}\n\n\
             ### 对话历史 ###\n{history}\n\n\
             ### 当前问题 ###\n{query}\n\n\
             ### 改写后的问题 ###\n"
        );
        keep_original_on_empty(self.gateway.complete(&prompt).await, query)
    }
}

/// Makes the compared entities in a comparative question explicit.
pub struct ComparativeRewriter {
    gateway: CompletionGateway,
}

impl ComparativeRewriter {
    pub fn new(gateway: CompletionGateway) -> Self {
        Self { gateway }
    }

    pub async fn rewrite(&self, query: &str, context: &str) -> String {
        let prompt = format!(
            "### 指令 ###\n{COMPARATIVE_INSTRUCTION}\n\n\
             ### 对话历史/上下文信息 ###\n{context}\n\n\
             ### 原始问题 ###\n{query}\n\n\
             ### 改写后的查询 ###\n"
        );
        keep_original_on_empty(self.gateway.complete(&prompt).await, query)
    }
}

/// Resolves pronouns and demonstratives to concrete named entities.
pub struct AmbiguousReferenceRewriter {
    gateway: CompletionGateway,
}

impl AmbiguousReferenceRewriter {
    pub fn new(gateway: CompletionGateway) -> Self {
        Self { gateway }
    }

    pub async fn rewrite(&self, query: &str, history: &str) -> String {
        let prompt = format!(
            "### 指令 ###\n{AMBIGUOUS_REFERENCE_INSTRUCTION}\n\n\
             ### 对话历史 ###\n{history}\n\n\
             ### 当前问题 ###\n{query}\n\n\
             ### 改写后的问题 ###\n"
        );
        keep_original_on_empty(self.gateway.complete(&prompt).await, query)
    }
}

/// Decomposes a compound question into independent sub-questions.
pub struct MultiIntentRewriter {
    gateway: CompletionGateway,
}

impl MultiIntentRewriter {
    pub fn new(gateway: CompletionGateway) -> Self {
        Self { gateway }
    }

    pub async fn rewrite(&self, query: &str) -> Vec<String> {
        let prompt = format!(
            "### 指令 ###\n{MULTI_INTENT_INSTRUCTION}\n\n\
             ### 原始问题 ###\n{query}\n\n\
             ### 分解后的问题列表 ###\n\
             请以JSON数组格式输出，例如：[\"问题1\", \"问题2\", \"问题3\"]\n"
        );
        let completion = self.gateway.complete(&prompt).await;
        match salvage::salvage_string_array(&completion) {
            Some(sub_queries) => sub_queries,
            // Unparseable output is still the model's best answer; pass it
            // through verbatim as a single sub-query.
            None => vec![completion],
        }
    }
}

/// Converts a rhetorical or emotionally loaded statement into a neutral,
/// retrieval-ready question.
pub struct RhetoricalRewriter {
    gateway: CompletionGateway,
}

impl RhetoricalRewriter {
    pub fn new(gateway: CompletionGateway) -> Self {
        Self { gateway }
    }

    pub async fn rewrite(&self, query: &str, history: &str) -> String {
        let prompt = format!(
            "### 指令 ###\n{RHETORICAL_INSTRUCTION}\n\n\
             ### 对话历史 ###\n{history}\n\n\
             ### 当前问题 ###\n{query}\n\n\
             ### 改写后的问题 ###\n"
        );
        keep_original_on_empty(self.gateway.complete(&prompt).await, query)
    }
}

fn keep_original_on_empty(completion: String, query: &str) -> String {
    if completion.is_empty() {
        query.to_string()
    } else {
        completion
    }
}

//! Injection of retrieved passages into the outgoing model request.

use serde::{Deserialize, Serialize};

/// One prior dialogue turn as the host runtime serializes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: String,
    pub content: String,
}

impl ContextMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// The host's outgoing model request, as seen at this crate's boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderRequest {
    /// The user's latest message.
    pub prompt: String,
    pub system_prompt: Option<String>,
    /// Prior turns, oldest first; the newest user turn is last.
    pub contexts: Vec<ContextMessage>,
}

/// Where retrieved text lands inside the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionMethod {
    /// Append to the system prompt (creating one if absent).
    #[default]
    SystemPrompt,
    /// Prepend to the user's own prompt.
    UserPrompt,
    /// Insert a fresh system message just before the newest context entry.
    InsertSystemPrompt,
}

/// Inject retrieved content into the request per the configured method.
/// Empty content is a no-op.
pub fn inject_content(req: &mut ProviderRequest, method: InjectionMethod, content: &str) {
    if content.is_empty() {
        return;
    }

    let block = format!("--- 以下是参考资料 ---\n{content}\n--- 请根据以上资料回答问题 ---");

    match method {
        InjectionMethod::UserPrompt => {
            req.prompt = format!("{block}\n\n{}", req.prompt);
            tracing::debug!("RAG content injected into user prompt");
        }
        InjectionMethod::InsertSystemPrompt => {
            // Before the last entry, so the user's newest message stays last.
            let idx = req.contexts.len().saturating_sub(1);
            req.contexts
                .insert(idx, ContextMessage::new("system", block));
            tracing::debug!("RAG content inserted as a new system message");
        }
        InjectionMethod::SystemPrompt => {
            req.system_prompt = Some(match req.system_prompt.take() {
                Some(existing) => format!("{existing}\n\n{block}"),
                None => block,
            });
            tracing::debug!("RAG content injected into system prompt");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProviderRequest {
        ProviderRequest {
            prompt: "原始问题".to_string(),
            system_prompt: Some("你是一个助手。".to_string()),
            contexts: vec![
                ContextMessage::new("user", "第一轮"),
                ContextMessage::new("assistant", "第一轮回答"),
                ContextMessage::new("user", "原始问题"),
            ],
        }
    }

    #[test]
    fn test_empty_content_is_noop() {
        let mut req = request();
        let before = req.clone();
        inject_content(&mut req, InjectionMethod::SystemPrompt, "");
        assert_eq!(req, before);
    }

    #[test]
    fn test_system_prompt_append() {
        let mut req = request();
        inject_content(&mut req, InjectionMethod::SystemPrompt, "资料A");
        let system = req.system_prompt.unwrap();
        assert!(system.starts_with("你是一个助手。"));
        assert!(system.contains("--- 以下是参考资料 ---\n资料A"));
    }

    #[test]
    fn test_system_prompt_created_when_absent() {
        let mut req = request();
        req.system_prompt = None;
        inject_content(&mut req, InjectionMethod::SystemPrompt, "资料A");
        assert!(req
            .system_prompt
            .unwrap()
            .starts_with("--- 以下是参考资料 ---"));
    }

    #[test]
    fn test_user_prompt_prepend() {
        let mut req = request();
        inject_content(&mut req, InjectionMethod::UserPrompt, "资料A");
        assert!(req.prompt.starts_with("--- 以下是参考资料 ---"));
        assert!(req.prompt.ends_with("原始问题"));
    }

    #[test]
    fn test_insert_system_prompt_keeps_newest_message_last() {
        let mut req = request();
        inject_content(&mut req, InjectionMethod::InsertSystemPrompt, "资料A");
        assert_eq!(req.contexts.len(), 4);
        assert_eq!(req.contexts[2].role, "system");
        assert_eq!(req.contexts[3].content, "原始问题");
    }

    #[test]
    fn test_insert_system_prompt_into_empty_contexts() {
        let mut req = ProviderRequest::default();
        inject_content(&mut req, InjectionMethod::InsertSystemPrompt, "资料A");
        assert_eq!(req.contexts.len(), 1);
        assert_eq!(req.contexts[0].role, "system");
    }
}

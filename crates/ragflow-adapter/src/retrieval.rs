//! RAGFlow retrieval client.
//!
//! Talks to the RAGFlow `/api/v1/retrieval` endpoint and hands back the
//! retrieved chunk contents joined into one block of reference text.
//! Retrieval is an enhancement like rewriting: every failure mode ends in
//! an empty string and a log entry, never an error to the caller.

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::AdapterConfig;

pub struct RetrievalClient {
    base_url: String,
    api_key: String,
    dataset_ids: Vec<String>,
    top_k: usize,
    similarity_threshold: f32,
    client: Client,
}

impl RetrievalClient {
    pub fn new(config: &AdapterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: config.ragflow_base_url.trim_end_matches('/').to_string(),
            api_key: config.ragflow_api_key.clone(),
            dataset_ids: config.ragflow_kb_ids.clone(),
            top_k: config.top_k,
            similarity_threshold: config.similarity_threshold,
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty() && !self.dataset_ids.is_empty()
    }

    /// Retrieve reference text for one question. Fail-soft: missing
    /// configuration, transport errors, API-level errors, and empty result
    /// sets all come back as `""`.
    pub async fn retrieve(&self, question: &str) -> String {
        if !self.is_configured() {
            tracing::warn!("RAGFlow is not fully configured, skipping retrieval");
            return String::new();
        }

        let url = format!("{}/api/v1/retrieval", self.base_url);
        let payload = json!({
            "question": question,
            "dataset_ids": self.dataset_ids,
            "top_k": self.top_k,
            "similarity_threshold": self.similarity_threshold,
        });

        tracing::info!(url = %url, question = %question, "Querying RAGFlow");

        let response = match self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "RAGFlow request failed");
                return String::new();
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read RAGFlow response body");
                return String::new();
            }
        };

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "RAGFlow returned an error status");
            return String::new();
        }

        match extract_content(&body) {
            Ok(content) => {
                if content.is_empty() {
                    tracing::info!("RAGFlow returned no relevant chunks");
                } else {
                    tracing::debug!(content = %content, "Retrieved reference content");
                }
                content
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to process RAGFlow response");
                String::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RetrievalEnvelope {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<RetrievalData>,
}

#[derive(Debug, Default, Deserialize)]
struct RetrievalData {
    #[serde(default)]
    chunks: Vec<RetrievedChunk>,
}

#[derive(Debug, Deserialize)]
struct RetrievedChunk {
    #[serde(default)]
    content: String,
}

/// Parse the RAGFlow envelope and join chunk contents with blank lines.
fn extract_content(body: &str) -> Result<String> {
    let envelope: RetrievalEnvelope = serde_json::from_str(body)?;

    if envelope.code != 0 {
        return Err(anyhow!(
            "RAGFlow API error (code {}): {}",
            envelope.code,
            envelope.message.unwrap_or_default()
        ));
    }

    let chunks = envelope.data.unwrap_or_default().chunks;
    let count = chunks.len();
    let content = chunks
        .into_iter()
        .map(|c| c.content)
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if count > 0 {
        tracing::info!(chunks = count, "Retrieved chunks from RAGFlow");
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_joins_chunks() {
        let body = r#"{
            "code": 0,
            "data": {"chunks": [
                {"content": "第一段", "similarity": 0.8},
                {"content": "第二段", "similarity": 0.6}
            ]}
        }"#;
        assert_eq!(extract_content(body).unwrap(), "第一段\n\n第二段");
    }

    #[test]
    fn test_extract_api_error_code() {
        let body = r#"{"code": 401, "message": "invalid token"}"#;
        let err = extract_content(body).unwrap_err();
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("invalid token"));
    }

    #[test]
    fn test_extract_no_chunks_is_empty() {
        assert_eq!(extract_content(r#"{"code": 0, "data": {"chunks": []}}"#).unwrap(), "");
        assert_eq!(extract_content(r#"{"code": 0}"#).unwrap(), "");
    }

    #[test]
    fn test_extract_rejects_malformed_body() {
        assert!(extract_content("<html>bad gateway</html>").is_err());
    }

    #[test]
    fn test_client_unconfigured_detection() {
        let client = RetrievalClient::new(&AdapterConfig::default()).unwrap();
        assert!(!client.is_configured());

        let config = AdapterConfig {
            ragflow_base_url: "https://rag.local/".into(),
            ragflow_api_key: "key".into(),
            ragflow_kb_ids: vec!["kb".into()],
            ..Default::default()
        };
        let client = RetrievalClient::new(&config).unwrap();
        assert!(client.is_configured());
        assert_eq!(client.base_url, "https://rag.local");
    }
}

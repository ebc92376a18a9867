use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use crate::chat::{ChatRequest, LlmResponse};

/// The chat-completion / embedding capability boundary (spec.md §6). The
/// core consumes these; it does not define the model behind them.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat_completion(&self, request: ChatRequest) -> Result<LlmResponse>;

    /// Fixed-dimension, deterministic-per-input embedding (1024 expected).
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Ollama-compatible HTTP client — the default, concrete implementation
/// backing the otherwise-abstract capability boundary, grounded on the
/// teacher's `OllamaClient` (`/api/chat`, `/api/embeddings`, best-effort
/// error-as-string-not-`Err` on request failure).
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    embed_model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, embed_model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            embed_model: embed_model.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new("http://localhost:11434", "nomic-embed-text")
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn chat_completion(&self, request: ChatRequest) -> Result<LlmResponse> {
        let endpoint = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let payload = json!({
            "model": request.model,
            "messages": messages_to_ollama(&request.messages()),
            "options": { "temperature": request.temperature },
            "stream": false,
        });

        let sent = self
            .client
            .post(&endpoint)
            .timeout(request.timeout)
            .json(&payload)
            .send()
            .await;

        // Model unavailability never propagates as Err — it comes back as
        // an error-shaped string the caller detects with looks_like_error().
        let response = match sent {
            Ok(response) => response,
            Err(error) => {
                return Ok(LlmResponse::new(format!(
                    "Ollama unavailable at {}. Error: {error}",
                    self.base_url
                )))
            }
        };

        let status = response.status();
        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(error) => {
                return Ok(LlmResponse::new(format!(
                    "Ollama response parse error: {error}"
                )))
            }
        };

        if !status.is_success() {
            return Ok(LlmResponse::new(format!("Ollama error ({status}): {body}")));
        }

        let content = body
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str());

        match content {
            Some(text) => Ok(LlmResponse::new(text.to_string())),
            None => Ok(LlmResponse::new(format!("Ollama response missing text: {body}"))),
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let endpoint = format!("{}/api/embeddings", self.base_url.trim_end_matches('/'));
        let payload = json!({ "model": self.embed_model, "prompt": text });

        let response = self.client.post(&endpoint).json(&payload).send().await?;
        let status = response.status();
        let body: serde_json::Value = response.json().await?;
        if !status.is_success() {
            anyhow::bail!("embedding request failed ({status}): {body}");
        }

        let embedding = body
            .get("embedding")
            .and_then(|v| v.as_array())
            .ok_or_else(|| anyhow::anyhow!("embedding response missing 'embedding' array"))?
            .iter()
            .filter_map(|v| v.as_f64())
            .map(|v| v as f32)
            .collect();
        Ok(embedding)
    }
}

fn messages_to_ollama(messages: &[crate::chat::ChatMessage]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .map(|m| {
            let role = match m.role {
                crate::chat::ChatRole::System => "system",
                crate::chat::ChatRole::User => "user",
                crate::chat::ChatRole::Assistant => "assistant",
            };
            json!({ "role": role, "content": m.content })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_sentinels_are_detected() {
        assert!(LlmResponse::new("").looks_like_error());
        assert!(LlmResponse::new("Ollama unavailable at http://x. Error: timeout").looks_like_error());
        assert!(LlmResponse::new("Request timed out").looks_like_error());
        assert!(!LlmResponse::new("APPROVE: strong fit").looks_like_error());
    }
}

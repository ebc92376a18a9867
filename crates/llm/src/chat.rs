use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// One chat-completion invocation's parameters, matching the external
/// capability contract in spec.md §6:
/// `chat_completion(system, prompt, model, temperature, timeout) -> {response}`.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: std::time::Duration,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            model: model.into(),
            temperature: 0.2,
            timeout: std::time::Duration::from_secs(30),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(self.prompt.clone()));
        messages
    }
}

/// The core only ever consumes a best-effort string and tolerates empty or
/// error responses (spec.md §6) — callers should check
/// [`LlmResponse::looks_like_error`] rather than matching on a specific
/// provider's sentinel text.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
}

impl LlmResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Abstracts spec.md §9's open question: the original system matched an
    /// `ollama_client`-specific `"Request timed out"` sentinel. Here any
    /// error-shaped narrative is recognized uniformly, so judgment,
    /// discovery, and briefing fallback paths share one detector.
    pub fn looks_like_error(&self) -> bool {
        if self.text.trim().is_empty() {
            return true;
        }
        let lower = self.text.to_lowercase();
        const SENTINELS: &[&str] = &[
            "request timed out",
            "unavailable at",
            "connection refused",
            "error (",
            "ollama error",
            "ollama unavailable",
            "response missing text",
        ];
        SENTINELS.iter().any(|s| lower.contains(s))
    }
}

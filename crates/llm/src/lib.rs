pub mod chat;
pub mod client;
pub mod structured;

pub use chat::{ChatMessage, ChatRequest, ChatRole, LlmResponse};
pub use client::{LlmClient, OllamaClient};
pub use structured::extract_json_output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use scoutdesk_config::AppConfig;
use scoutdesk_llm::{LlmClient, OllamaClient};
use scoutdesk_memory::MemoryManager;

/// Everything a subcommand needs: the loaded config, a ready memory
/// manager, and the external clients that back the LLM/fetch capability
/// boundaries (spec.md §6).
pub struct AppContext {
    pub config: AppConfig,
    pub llm: OllamaClient,
    pub http: reqwest::Client,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Result<Self> {
        let llm = OllamaClient::new(config.llm.base_url.clone(), config.llm.embed_model.clone());
        let http = reqwest::Client::builder().timeout(Duration::from_secs(config.llm.request_timeout_secs)).build()?;
        Ok(Self { config, llm, http })
    }

    pub fn data_root(&self) -> PathBuf {
        self.config.data_root()
    }

    pub fn open_memory(&self) -> Result<MemoryManager> {
        MemoryManager::open(self.data_root())
    }

    pub fn llm_client(&self) -> &dyn LlmClient {
        &self.llm
    }

    pub fn model(&self) -> &str {
        &self.config.llm.chat_model
    }
}

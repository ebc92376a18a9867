use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Root of the persisted-state layout: `<data>/notebooks/...`,
    /// `<data>/memory/...`, `<data>/supervisor_config.yaml`.
    pub root: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleDefaults {
    pub frequency: String,
    pub max_items_per_run: usize,
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        Self {
            frequency: "daily".to_string(),
            max_items_per_run: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub chat_model: String,
    pub embed_model: String,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.1:8b".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Workspace-level configuration, TOML-backed, analogous in shape to the
/// teacher's struct-of-structs `AppConfig`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub schedule: ScheduleDefaults,
    pub llm: LlmConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        if let Ok(value) = env::var("SCOUTDESK_OLLAMA_BASE_URL") {
            if !value.is_empty() {
                config.llm.base_url = value;
            }
        }
        if let Ok(value) = env::var("SCOUTDESK_DATA_ROOT") {
            if !value.is_empty() {
                config.data.root = value;
            }
        }

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    pub fn data_root(&self) -> PathBuf {
        PathBuf::from(&self.data.root)
    }
}

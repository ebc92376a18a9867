use std::fs;
use std::io::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Named thresholds from spec.md §9 — "not magic numbers". Reused verbatim
/// by `scoutdesk-gatherer` (confidence floor) and `scoutdesk-supervisor`
/// (judgment algorithm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OversightThresholds {
    pub auto_approve_threshold: f32,
    pub confidence_floor: f32,
    pub overlap_reject_threshold: f32,
}

impl Default for OversightThresholds {
    fn default() -> Self {
        Self {
            auto_approve_threshold: 0.85,
            confidence_floor: 0.50,
            overlap_reject_threshold: 0.80,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Free-text voice used to flavor narrative generations (briefings,
    /// overwatch asides, conversational replies).
    pub personality: String,
    pub thresholds: OversightThresholds,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            personality: "a terse, well-read research aide".to_string(),
            thresholds: OversightThresholds::default(),
        }
    }
}

impl SupervisorConfig {
    pub fn path_for(data_root: impl AsRef<Path>) -> std::path::PathBuf {
        data_root.as_ref().join("supervisor_config.yaml")
    }

    pub fn load_or_default(data_root: impl AsRef<Path>) -> Result<Self> {
        let path = Self::path_for(&data_root);
        match fs::read_to_string(&path) {
            Ok(raw) => serde_yaml::from_str(&raw)
                .with_context(|| format!("parsing {}", path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
        }
    }

    pub fn save(&self, data_root: impl AsRef<Path>) -> Result<()> {
        let path = Self::path_for(&data_root);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = serde_yaml::to_string(self)?;
        let tmp_path = path.with_extension("yaml.tmp");
        {
            let mut tmp = fs::File::create(&tmp_path)?;
            tmp.write_all(rendered.as_bytes())?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_named_constants() {
        let thresholds = OversightThresholds::default();
        assert_eq!(thresholds.auto_approve_threshold, 0.85);
        assert_eq!(thresholds.confidence_floor, 0.50);
        assert_eq!(thresholds.overlap_reject_threshold, 0.80);
    }

    #[test]
    fn missing_supervisor_config_loads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SupervisorConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(cfg.thresholds.confidence_floor, 0.50);
    }
}

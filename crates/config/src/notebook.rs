use std::collections::HashMap;
use std::fs;
use std::io::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How often the Ambient Orchestrator is allowed to dispatch collection
/// tasks for a notebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionMode {
    Manual,
    Automatic,
    Hybrid,
}

impl Default for CollectionMode {
    fn default() -> Self {
        CollectionMode::Hybrid
    }
}

/// Governs how collected items move out of the approval queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    Auto,
    Review,
    Mixed,
}

impl Default for ApprovalMode {
    fn default() -> Self {
        ApprovalMode::Mixed
    }
}

/// A regulator-filed entity to track (source kind `filing`).
///
/// `company_name` backs the quoted-name fallback search path; a bare ticker
/// must never be used as a full-text query (see `scoutdesk-fetch`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingSource {
    pub ticker: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub filing_types: Vec<String>,
}

/// Keyed mapping from source-kind to its kind-specific config list
/// (spec.md §4.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub feed: Vec<String>,
    pub web_page: Vec<String>,
    pub filing: Vec<FilingSource>,
    pub video_channel: Vec<String>,
    pub video_keyword: Vec<String>,
    pub paper_category: Vec<String>,
    pub paper_query: Vec<String>,
    pub news_keyword: Vec<String>,
}

impl SourcesConfig {
    pub fn is_empty(&self) -> bool {
        self.feed.is_empty()
            && self.web_page.is_empty()
            && self.filing.is_empty()
            && self.video_channel.is_empty()
            && self.video_keyword.is_empty()
            && self.paper_category.is_empty()
            && self.paper_query.is_empty()
            && self.news_keyword.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    /// Cron-like frequency label consumed by `scoutdesk-orchestrator`
    /// ("daily", "weekly", or an explicit cron expression).
    pub frequency: String,
    pub max_items_per_run: usize,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            frequency: "daily".to_string(),
            max_items_per_run: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub max_age_days: u32,
    pub min_relevance: f32,
    pub language: String,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            max_age_days: 90,
            min_relevance: 0.0,
            language: "en".to_string(),
        }
    }
}

/// One notebook's research profile — the unit the Supervisor reads to build
/// tasks and the Gatherer reads to execute them. Mutated only via explicit
/// update; persisted atomically as YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebookProfile {
    pub notebook_id: Uuid,
    pub subject: String,
    pub intent: String,
    pub focus_areas: Vec<String>,
    pub excluded_topics: Vec<String>,
    pub disabled_sources: Vec<String>,
    pub collection_mode: CollectionMode,
    pub approval_mode: ApprovalMode,
    pub sources: SourcesConfig,
    pub schedule: Schedule,
    pub filters: Filters,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Extra per-notebook knobs that don't warrant a dedicated field yet.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for NotebookProfile {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            notebook_id: Uuid::nil(),
            subject: String::new(),
            intent: String::new(),
            focus_areas: Vec::new(),
            excluded_topics: Vec::new(),
            disabled_sources: Vec::new(),
            collection_mode: CollectionMode::default(),
            approval_mode: ApprovalMode::default(),
            sources: SourcesConfig::default(),
            schedule: Schedule::default(),
            filters: Filters::default(),
            created_at: now,
            updated_at: now,
            extra: HashMap::new(),
        }
    }
}

impl NotebookProfile {
    pub fn new(notebook_id: Uuid, subject: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            notebook_id,
            subject: subject.into(),
            intent: intent.into(),
            ..Self::default()
        }
    }

    /// Path convention from the persisted-state layout:
    /// `<data>/notebooks/<notebook_id>/collector.yaml`.
    pub fn path_for(data_root: impl AsRef<Path>, notebook_id: Uuid) -> std::path::PathBuf {
        data_root
            .as_ref()
            .join("notebooks")
            .join(notebook_id.to_string())
            .join("collector.yaml")
    }

    /// Readers tolerate absence — a missing profile is not an error, it
    /// yields a fresh default tagged with the requested id.
    pub fn load_or_default(data_root: impl AsRef<Path>, notebook_id: Uuid) -> Result<Self> {
        let path = Self::path_for(&data_root, notebook_id);
        match fs::read_to_string(&path) {
            Ok(raw) => {
                let mut profile: NotebookProfile = serde_yaml::from_str(&raw)
                    .with_context(|| format!("parsing notebook profile at {}", path.display()))?;
                profile.notebook_id = notebook_id;
                Ok(profile)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::new(notebook_id, "", ""))
            }
            Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
        }
    }

    /// Full-overwrite atomic write: render to a sibling temp file, flush,
    /// then rename into place so concurrent readers never observe a partial
    /// write.
    pub fn save(&self, data_root: impl AsRef<Path>) -> Result<()> {
        let path = Self::path_for(&data_root, self.notebook_id);
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

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_profile_loads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let profile = NotebookProfile::load_or_default(dir.path(), id).unwrap();
        assert_eq!(profile.notebook_id, id);
        assert_eq!(profile.subject, "");
        assert_eq!(profile.approval_mode, ApprovalMode::Mixed);
    }

    #[test]
    fn round_trips_through_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let mut profile = NotebookProfile::new(id, "Costco", "Track Costco Wholesale");
        profile.focus_areas = vec!["financials".into(), "membership".into()];
        profile.sources.feed.push("https://example.com/rss".into());
        profile.save(dir.path()).unwrap();

        let loaded = NotebookProfile::load_or_default(dir.path(), id).unwrap();
        assert_eq!(loaded.subject, "Costco");
        assert_eq!(loaded.focus_areas, profile.focus_areas);
        assert_eq!(loaded.sources.feed, profile.sources.feed);
    }

    #[test]
    fn empty_sources_config_reports_empty() {
        assert!(SourcesConfig::default().is_empty());
    }
}

use serde::{Deserialize, Serialize};

/// spec.md §4.2 stage 1 classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotebookPurpose {
    CompanyResearch,
    TopicResearch,
    ProductResearch,
    SkillDevelopment,
    PersonTracking,
    IndustryMonitoring,
    ProjectKnowledge,
    PersonalInterests,
}

impl NotebookPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotebookPurpose::CompanyResearch => "company_research",
            NotebookPurpose::TopicResearch => "topic_research",
            NotebookPurpose::ProductResearch => "product_research",
            NotebookPurpose::SkillDevelopment => "skill_development",
            NotebookPurpose::PersonTracking => "person_tracking",
            NotebookPurpose::IndustryMonitoring => "industry_monitoring",
            NotebookPurpose::ProjectKnowledge => "project_knowledge",
            NotebookPurpose::PersonalInterests => "personal_interests",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "company_research" => NotebookPurpose::CompanyResearch,
            "product_research" => NotebookPurpose::ProductResearch,
            "skill_development" => NotebookPurpose::SkillDevelopment,
            "person_tracking" => NotebookPurpose::PersonTracking,
            "industry_monitoring" => NotebookPurpose::IndustryMonitoring,
            "project_knowledge" => NotebookPurpose::ProjectKnowledge,
            "personal_interests" => NotebookPurpose::PersonalInterests,
            _ => NotebookPurpose::TopicResearch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSensitivity {
    Breaking,
    Daily,
    Weekly,
    Normal,
    Archival,
}

impl TimeSensitivity {
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "breaking" => TimeSensitivity::Breaking,
            "daily" => TimeSensitivity::Daily,
            "weekly" => TimeSensitivity::Weekly,
            "archival" => TimeSensitivity::Archival,
            _ => TimeSensitivity::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchDepth {
    Surface,
    Standard,
    Deep,
}

impl ResearchDepth {
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "surface" => ResearchDepth::Surface,
            "deep" => ResearchDepth::Deep,
            _ => ResearchDepth::Standard,
        }
    }
}

/// What the intent-analysis model returns — the shape `extract_json_output`
/// deserializes into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentAnalysisRaw {
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub geographic_focus: Option<String>,
    #[serde(default)]
    pub time_sensitivity: String,
    #[serde(default)]
    pub research_depth: String,
    #[serde(default)]
    pub primary_topic: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub is_private: Option<bool>,
}

/// Resolved stage-1 output after subject override, purpose parsing, and
/// (for `company_research`) ticker enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentAnalysis {
    pub purpose: NotebookPurpose,
    pub primary_topic: String,
    pub entities: Vec<String>,
    pub industry: Option<String>,
    pub competitors: Vec<String>,
    pub keywords: Vec<String>,
    pub geographic_focus: Option<String>,
    pub time_sensitivity: TimeSensitivity,
    pub research_depth: ResearchDepth,
    pub ticker: Option<String>,
    pub is_private: bool,
    /// Set when `company_research` could not resolve to an identifiable
    /// entity — the caller should prompt the user rather than guess
    /// (spec.md §4.2).
    pub needs_clarification: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    AutoApprove,
    Suggest,
    Skip,
}

/// spec.md §4.2: auto_approve is true at confidence ≥ 0.85.
pub const AUTO_APPROVE_CONFIDENCE: f32 = 0.85;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredSource {
    pub kind: String,
    pub value: String,
    pub name: String,
    pub rationale: String,
    pub confidence: f32,
    pub auto_approve: bool,
    pub disposition: Disposition,
}

impl DiscoveredSource {
    pub fn new(kind: impl Into<String>, value: impl Into<String>, name: impl Into<String>, confidence: f32) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        let auto_approve = confidence >= AUTO_APPROVE_CONFIDENCE;
        let disposition = if auto_approve {
            Disposition::AutoApprove
        } else if confidence >= 0.5 {
            Disposition::Suggest
        } else {
            Disposition::Skip
        };
        Self {
            kind: kind.into(),
            value: value.into(),
            name: name.into(),
            rationale: String::new(),
            confidence,
            auto_approve,
            disposition,
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub analysis: IntentAnalysis,
    pub sources: Vec<DiscoveredSource>,
    pub errors: Vec<String>,
}

/// Sorts `auto_approve` first, `suggest` next, `skip` last — ties broken by
/// descending confidence (spec.md §4.2).
pub fn sort_sources(sources: &mut [DiscoveredSource]) {
    sources.sort_by(|a, b| {
        let rank = |d: Disposition| match d {
            Disposition::AutoApprove => 0,
            Disposition::Suggest => 1,
            Disposition::Skip => 2,
        };
        rank(a.disposition)
            .cmp(&rank(b.disposition))
            .then(b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_at_threshold_auto_approves() {
        let s = DiscoveredSource::new("news_keyword", "acme", "Acme news", 0.85);
        assert!(s.auto_approve);
        assert_eq!(s.disposition, Disposition::AutoApprove);
    }

    #[test]
    fn sort_orders_auto_approve_before_suggest_before_skip() {
        let mut sources = vec![
            DiscoveredSource::new("a", "a", "a", 0.2),
            DiscoveredSource::new("b", "b", "b", 0.9),
            DiscoveredSource::new("c", "c", "c", 0.6),
        ];
        sort_sources(&mut sources);
        assert_eq!(sources[0].kind, "b");
        assert_eq!(sources[1].kind, "c");
        assert_eq!(sources[2].kind, "a");
    }
}

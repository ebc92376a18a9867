use chrono::{DateTime, Utc};

use crate::schema::{CollectedItem, SourceHealth};

/// spec.md §4.3: preference-learned adjustments layered onto the base
/// confidence score.
#[derive(Debug, Clone, Default)]
pub struct LearnedPreferences {
    pub preferred_topics: Vec<String>,
    pub preferred_sources: Vec<String>,
    pub rejected_patterns: Vec<String>,
}

/// Piecewise freshness curve from spec.md §4.3: <24h=1.0, <72h=0.8,
/// <168h=0.6, older but within `max_age_days*24h` linearly decays to 0.3,
/// else 0.0.
pub fn freshness_score(published_at: DateTime<Utc>, now: DateTime<Utc>, max_age_days: u32) -> f32 {
    let age_hours = (now - published_at).num_minutes() as f32 / 60.0;
    if age_hours < 0.0 {
        return 1.0;
    }
    if age_hours < 24.0 {
        return 1.0;
    }
    if age_hours < 72.0 {
        return 0.8;
    }
    if age_hours < 168.0 {
        return 0.6;
    }

    let max_age_hours = max_age_days as f32 * 24.0;
    if age_hours <= max_age_hours {
        let span = (max_age_hours - 168.0).max(1.0);
        let progress = (age_hours - 168.0) / span;
        return (0.6 - progress * (0.6 - 0.3)).max(0.3);
    }

    0.0
}

/// +0.1 per category match against preferred topics/sources, −0.2 on a
/// rejected-pattern URL match. Each category caps at a single bonus.
pub fn learned_bonus(item: &CollectedItem, prefs: &LearnedPreferences) -> (f32, Vec<String>) {
    let mut bonus = 0.0;
    let mut reasons = Vec::new();
    let haystack = format!("{} {}", item.title, item.content).to_lowercase();

    if prefs.preferred_topics.iter().any(|t| haystack.contains(&t.to_lowercase())) {
        bonus += 0.1;
        reasons.push("matches a preferred topic".to_string());
    }
    if prefs.preferred_sources.iter().any(|s| item.source_name.to_lowercase().contains(&s.to_lowercase())) {
        bonus += 0.1;
        reasons.push("matches a preferred source".to_string());
    }
    if let Some(url) = &item.url {
        if prefs.rejected_patterns.iter().any(|p| url.to_lowercase().contains(&p.to_lowercase())) {
            bonus -= 0.2;
            reasons.push("matches a previously rejected pattern".to_string());
        }
    }

    (bonus, reasons)
}

/// `_calculate_confidence` from spec.md §4.3:
/// `overall = 0.5*relevance + 0.3*trust + 0.2*freshness + learned_bonus`,
/// clamped to [0,1]; freshness==0 additionally caps overall at ≤0.35.
pub fn calculate_confidence(
    relevance: f32,
    source_health: SourceHealth,
    published_at: DateTime<Utc>,
    now: DateTime<Utc>,
    max_age_days: u32,
    item: &CollectedItem,
    prefs: &LearnedPreferences,
) -> (f32, f32, f32, f32, Vec<String>) {
    let relevance = relevance.clamp(0.0, 1.0);
    let trust = source_health.trust_score();
    let freshness = freshness_score(published_at, now, max_age_days);
    let (bonus, mut reasons) = learned_bonus(item, prefs);

    let mut overall = 0.5 * relevance + 0.3 * trust + 0.2 * freshness + bonus;
    overall = overall.clamp(0.0, 1.0);
    if freshness == 0.0 {
        overall = overall.min(0.35);
        reasons.push("no extractable publication date within max age — capped".to_string());
    }

    reasons.insert(0, format!("relevance={relevance:.2} trust={trust:.2} freshness={freshness:.2}"));
    (relevance, trust, freshness, overall, reasons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn overall_clamped_to_unit_interval() {
        let now = Utc::now();
        let item = CollectedItem::from_fetched(&scoutdesk_fetch::FetchedItem::new(
            "t",
            "c",
            "s",
            scoutdesk_fetch::SourceKind::WebPage,
            "u",
        ));
        let prefs = LearnedPreferences {
            preferred_topics: vec!["t".to_string()],
            preferred_sources: vec!["s".to_string()],
            rejected_patterns: vec![],
        };
        let (_, _, _, overall, _) = calculate_confidence(1.0, SourceHealth::Healthy, now, now, 90, &item, &prefs);
        assert!((0.0..=1.0).contains(&overall));
    }

    #[test]
    fn zero_freshness_caps_overall_at_035() {
        let now = Utc::now();
        let ancient = now - Duration::days(400);
        let item = CollectedItem::from_fetched(&scoutdesk_fetch::FetchedItem::new(
            "t",
            "c",
            "s",
            scoutdesk_fetch::SourceKind::WebPage,
            "u",
        ));
        let prefs = LearnedPreferences::default();
        let (_, _, freshness, overall, _) = calculate_confidence(1.0, SourceHealth::Healthy, ancient, now, 90, &item, &prefs);
        assert_eq!(freshness, 0.0);
        assert!(overall <= 0.35);
    }
}

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use scoutdesk_config::{NotebookProfile, SourcesConfig};
use scoutdesk_fetch::{fetch_all, FetchedItem};
use scoutdesk_llm::{ChatRequest, LlmClient};
use scoutdesk_memory::{ArchiveHit, ArchiveRecord, MemoryManager, Namespace, Reader, SignalType, UserSignal};
use tracing::{info, warn};
use uuid::Uuid;

use crate::contextualize::contextualize;
use crate::dedup::{is_similar_to_avoid_list, DedupSets, SEMANTIC_DEDUP_THRESHOLD};
use crate::diversity::enforce_diversity;
use crate::health::HealthTable;
use crate::keywords::assemble_keywords;
use crate::queue::{decide, ApprovalQueue, QueueDecision};
use crate::resource_list::{is_resource_list_page, partition_links, MAX_ARTICLES_PER_FEED, MAX_EXPANDED_FEEDS, MAX_EXPANDED_PAGES};
use crate::schema::{CollectedItem, CollectionOutcome, CollectionTask, FeedbackType, ItemStatus};
use crate::scoring::{calculate_confidence, LearnedPreferences};

const RELEVANCE_SYSTEM_PROMPT: &str = "Score how relevant the following item is to a research \
notebook's focus, from 0.0 (irrelevant) to 1.0 (directly on-topic). Respond with only a number.";

const CONCURRENT_PROCESSING_PERMITS: usize = 4;

/// Per-notebook worker (spec.md §4.3).
pub struct Gatherer {
    pub notebook_id: Uuid,
    pub profile: NotebookProfile,
    pub queue: ApprovalQueue,
    pub health: HealthTable,
    dedup: DedupSets,
    data_root: PathBuf,
}

impl Gatherer {
    pub fn open(data_root: &Path, notebook_id: Uuid) -> Result<Self> {
        let profile = NotebookProfile::load_or_default(data_root, notebook_id)?;
        let queue = ApprovalQueue::load_or_default(data_root, notebook_id)?;
        let mut dedup = DedupSets::new();
        for entry in queue.entries() {
            dedup.record(entry.item.url.as_deref(), &entry.item.content_hash);
        }
        Ok(Self {
            notebook_id,
            profile,
            queue,
            health: HealthTable::new(),
            dedup,
            data_root: data_root.to_path_buf(),
        })
    }

    /// spec.md §4.3: immediate fast collection after notebook creation,
    /// limited to fast/cached sources (feeds only — no filing/video/paper
    /// adapters, which require slower round trips or ticker resolution).
    pub async fn run_first_sweep(
        &mut self,
        client: &reqwest::Client,
        llm: &dyn LlmClient,
        model: &str,
        memory: &mut MemoryManager,
    ) -> Result<CollectionOutcome> {
        let task = CollectionTask {
            notebook_id: self.notebook_id,
            intent: self.profile.intent.clone(),
            focus_areas: self.profile.focus_areas.clone(),
            mode: "first_sweep".to_string(),
            ..Default::default()
        };
        let mut fast_sources = self.profile.sources.clone();
        fast_sources.web_page.clear();
        fast_sources.filing.clear();
        fast_sources.video_channel.clear();
        fast_sources.video_keyword.clear();
        fast_sources.paper_category.clear();
        fast_sources.paper_query.clear();

        let prefs = LearnedPreferences::default();
        self.execute_collection_task_with_sources(&task, client, llm, model, memory, &fast_sources, &prefs, Duration::from_secs(30)).await
    }

    /// spec.md §4.3's core worker entry.
    pub async fn execute_collection_task(
        &mut self,
        task: &CollectionTask,
        client: &reqwest::Client,
        llm: &dyn LlmClient,
        model: &str,
        memory: &mut MemoryManager,
        prefs: &LearnedPreferences,
        deadline: Duration,
    ) -> Result<CollectionOutcome> {
        let sources = self.profile.sources.clone();
        self.execute_collection_task_with_sources(task, client, llm, model, memory, &sources, prefs, deadline).await
    }

    async fn execute_collection_task_with_sources(
        &mut self,
        task: &CollectionTask,
        client: &reqwest::Client,
        llm: &dyn LlmClient,
        model: &str,
        memory: &mut MemoryManager,
        sources: &SourcesConfig,
        prefs: &LearnedPreferences,
        deadline: Duration,
    ) -> Result<CollectionOutcome> {
        let start = Instant::now();
        let subject = if self.profile.subject.is_empty() { self.profile.intent.clone() } else { self.profile.subject.clone() };

        // Step 1: keyword assembly.
        let mentions = std::collections::HashMap::new();
        let keywords = assemble_keywords(task, &subject, &mentions);

        // Step 2: source-config enrichment is a no-op here — seed
        // domains/authors are folded in by scoutdesk-discovery before a
        // task is ever built; the Gatherer just consumes the profile's
        // sources as handed to it.
        let enriched_sources = sources.clone();

        // Step 3: fetch, bounded by min(60s, remaining_deadline - 60s).
        let elapsed = start.elapsed();
        let remaining = deadline.saturating_sub(elapsed);
        let fetch_budget = remaining.saturating_sub(Duration::from_secs(60)).min(Duration::from_secs(60)).max(Duration::from_secs(5));
        let outcome = fetch_all(client, &enriched_sources, &keywords, None, fetch_budget).await;
        let mut fetched = outcome.items;
        let mut partial = outcome.partial;

        // Step 4: resource-list detection and expansion.
        fetched = self.expand_resource_lists(client, fetched, deadline.saturating_sub(start.elapsed())).await;

        // Step 5: bounded-parallel dedup + scoring.
        let remaining_for_scoring = deadline.saturating_sub(start.elapsed());
        let skip_scoring = remaining_for_scoring < Duration::from_secs(20);
        let processed = self.process_items(fetched, task, llm, model, memory, prefs, skip_scoring).await;

        // Step 6: contextualization, skipped within 25s of deadline.
        let remaining_for_context = deadline.saturating_sub(start.elapsed());
        let skip_context = remaining_for_context < Duration::from_secs(25);
        let mut contextualized = Vec::with_capacity(processed.len());
        for mut item in processed {
            if !skip_context {
                let embedding = embed_or_empty(llm, &item.content).await;
                let found = memory.search_archive(Reader::Gatherer { notebook_id: self.notebook_id }, &embedding, 10, 0.3);
                let hits: Vec<ArchiveHit> = found
                    .iter()
                    .filter_map(|(id, sim)| memory.get_archive_record(*id).map(|record| ArchiveHit { record, similarity: *sim }))
                    .collect();
                contextualize(llm, model, &mut item, &hits).await;
            }
            contextualized.push(item);
        }

        // Step 7: diversity enforcement.
        let max_items = self.profile.schedule.max_items_per_run;
        let selected = enforce_diversity(contextualized, max_items);

        if deadline.saturating_sub(start.elapsed()).is_zero() {
            partial = true;
        }

        for item in &selected {
            self.dedup.record(item.url.as_deref(), &item.content_hash);
        }

        Ok(CollectionOutcome { items: selected, partial })
    }

    async fn expand_resource_lists(
        &mut self,
        client: &reqwest::Client,
        fetched: Vec<FetchedItem>,
        remaining_deadline: Duration,
    ) -> Vec<FetchedItem> {
        if remaining_deadline < Duration::from_secs(45) {
            return fetched;
        }

        let mut out = Vec::with_capacity(fetched.len());
        for item in fetched {
            let urls: Vec<String> = item
                .metadata
                .get("links")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                .unwrap_or_default();
            let word_count = item.content.split_whitespace().count();
            if urls.is_empty() || !is_resource_list_page(&item.title, word_count, &urls) {
                out.push(item);
                continue;
            }

            info!(title = %item.title, link_count = urls.len(), "expanding resource-list page");
            let partitioned = partition_links(&urls);

            for feed_url in partitioned.feed_like.iter().take(MAX_EXPANDED_FEEDS) {
                if let Ok(mut entries) = scoutdesk_fetch::adapters::feed::fetch_feed(client, feed_url).await {
                    entries.truncate(MAX_ARTICLES_PER_FEED);
                    out.extend(entries);
                }
            }
            for page_url in partitioned.regular.iter().take(MAX_EXPANDED_PAGES) {
                if let Ok(page) = scoutdesk_fetch::adapters::web_page::fetch_web_page(client, page_url).await {
                    out.push(page);
                }
            }
            // The list page itself is always dropped per spec.md §4.3 step 4.
        }
        out
    }

    async fn process_items(
        &mut self,
        fetched: Vec<FetchedItem>,
        task: &CollectionTask,
        llm: &dyn LlmClient,
        model: &str,
        memory: &mut MemoryManager,
        prefs: &LearnedPreferences,
        skip_scoring: bool,
    ) -> Vec<CollectedItem> {
        let mut candidates = Vec::new();
        for fetched_item in fetched {
            if self.dedup.seen_url(fetched_item.url.as_deref().unwrap_or_default()) || self.dedup.seen_hash(&fetched_item.content_hash)
            {
                continue;
            }
            if is_similar_to_avoid_list(&fetched_item.content, &task.avoid_similar_to) {
                continue;
            }

            let embedding = embed_or_empty(llm, &fetched_item.content).await;
            let semantic_hits = memory.search_archive(Reader::Gatherer { notebook_id: self.notebook_id }, &embedding, 1, SEMANTIC_DEDUP_THRESHOLD);
            if !semantic_hits.is_empty() {
                continue;
            }
            candidates.push(fetched_item);
        }

        let max_age_days = self.profile.filters.max_age_days;
        let intent = &task.intent;
        let health = &self.health;

        stream::iter(candidates.into_iter().map(|fetched_item| {
            let source_health = health.health_of(&fetched_item.source_name);
            async move {
                let mut item = CollectedItem::from_fetched(&fetched_item);

                let relevance = if skip_scoring {
                    0.5
                } else {
                    score_relevance(llm, model, intent, &fetched_item).await
                };

                let (rel, trust, fresh, overall, reasons) =
                    calculate_confidence(relevance, source_health, item.collected_at, Utc::now(), max_age_days, &item, prefs);
                item.relevance_score = rel;
                item.source_trust = trust;
                item.freshness_score = fresh;
                item.overall_confidence = overall;
                item.confidence_reasons = reasons;
                item
            }
        }))
        .buffer_unordered(CONCURRENT_PROCESSING_PERMITS)
        .collect::<Vec<_>>()
        .await
    }

    pub fn approve_item(&mut self, id: Uuid) -> Result<Option<CollectedItem>> {
        let entry = self.queue.remove(id)?;
        Ok(entry.map(|e| {
            let mut item = e.item;
            item.status = ItemStatus::Approved;
            item
        }))
    }

    pub fn reject_item(&mut self, id: Uuid, feedback_type: FeedbackType) -> Result<Option<CollectedItem>> {
        let entry = self.queue.remove(id)?;
        let Some(entry) = entry else { return Ok(None) };
        let mut item = entry.item;
        item.status = ItemStatus::Rejected;

        match feedback_type {
            FeedbackType::BadSource => self.health.degrade(&item.source_name),
            FeedbackType::TooOld => {
                self.profile.filters.max_age_days = self.profile.filters.max_age_days.saturating_sub(7).max(7);
            }
            FeedbackType::WrongTopic | FeedbackType::AlreadyKnew | FeedbackType::Other => {}
        }

        Ok(Some(item))
    }

    pub fn approve_batch(&mut self, ids: &[Uuid]) -> Result<Vec<CollectedItem>> {
        let mut approved = Vec::new();
        for id in ids {
            if let Some(item) = self.approve_item(*id)? {
                approved.push(item);
            }
        }
        Ok(approved)
    }

    pub fn approve_all_from_source(&mut self, source_name: &str) -> Result<Vec<CollectedItem>> {
        let entries = self.queue.remove_all_from_source(source_name)?;
        Ok(entries
            .into_iter()
            .map(|e| {
                let mut item = e.item;
                item.status = ItemStatus::Approved;
                item
            })
            .collect())
    }

    pub fn get_pending_approvals(&self) -> Vec<&CollectedItem> {
        self.queue.entries().iter().map(|e| &e.item).collect()
    }

    pub fn get_expiring_soon(&self, days: i64) -> Vec<&CollectedItem> {
        self.queue.expiring_within(days).into_iter().map(|e| &e.item).collect()
    }

    /// `wrong_topic`/pattern feedback reduces priority for future matching
    /// sources — recorded as a focus-area exclusion hook (spec.md §4.3).
    pub fn reduce_priority_for_patterns(&mut self, patterns: &[String]) {
        for pattern in patterns {
            if !self.profile.excluded_topics.iter().any(|t| t == pattern) {
                self.profile.excluded_topics.push(pattern.clone());
            }
        }
    }

    pub fn expand_focus_areas(&mut self, search_misses: &[String]) {
        for miss in search_misses {
            if !self.profile.focus_areas.iter().any(|a| a == miss) {
                self.profile.focus_areas.push(miss.clone());
            }
        }
    }

    /// spec.md §4.3 approval queue policy, applied to one freshly-scored
    /// item: `mixed` may still auto-approve inside this path, in which case
    /// it is stored the same way a user-approved item is, not merely
    /// tagged — a queued item the user never sees still has to land
    /// somewhere durable.
    pub async fn route_item(
        &mut self,
        item: CollectedItem,
        client: &reqwest::Client,
        llm: &dyn LlmClient,
        memory: &mut MemoryManager,
    ) -> Result<ItemStatus> {
        match decide(self.profile.approval_mode, &item) {
            QueueDecision::AutoApprove => {
                let stored = self.persist_approval(item, client, llm, memory).await?;
                Ok(stored.status)
            }
            QueueDecision::Queue => {
                self.queue.push(item)?;
                Ok(ItemStatus::Pending)
            }
        }
    }

    pub async fn persist_approval(
        &mut self,
        mut item: CollectedItem,
        client: &reqwest::Client,
        llm: &dyn LlmClient,
        memory: &mut MemoryManager,
    ) -> Result<CollectedItem> {
        if item.content.chars().count() < 1000 {
            if let Some(url) = item.url.clone() {
                if let Ok(page) = scoutdesk_fetch::adapters::web_page::fetch_web_page(client, &url).await {
                    if page.content.len() > item.content.len() {
                        item.content = page.content;
                    }
                }
            }
        }

        if item.content.chars().count() < 500 {
            warn!(title = %item.title, "approved item still below the 500-char floor after deep fetch; dropping");
            item.status = ItemStatus::Rejected;
            return Ok(item);
        }

        item.status = ItemStatus::Approved;
        self.health.record_success(&item.source_name);

        let record = ArchiveRecord {
            id: Uuid::new_v4(),
            namespace: Namespace::Gatherer,
            source_notebook_id: Some(self.notebook_id),
            content: item.content.clone(),
            content_type: "collected_item".to_string(),
            source_type: item.source_kind.clone(),
            topics: Vec::new(),
            entities: Vec::new(),
            importance: item.overall_confidence,
            created_at: Utc::now(),
            embedding: Some(embed_or_empty(llm, &item.content).await),
        };
        memory.add_archive_record(record)?;

        let signal = UserSignal::new(self.notebook_id, SignalType::ItemApproved).with_item(item.id);
        memory.record_signal(signal).await?;

        Ok(item)
    }

    pub fn save(&self) -> Result<()> {
        self.profile.save(&self.data_root)?;
        self.queue.save()
    }
}

async fn score_relevance(llm: &dyn LlmClient, model: &str, intent: &str, item: &FetchedItem) -> f32 {
    let prompt = format!(
        "Research intent: {intent}\nItem title: {}\nItem preview: {}",
        item.title,
        item.content.chars().take(500).collect::<String>()
    );
    let request = ChatRequest::new(prompt, model).with_system(RELEVANCE_SYSTEM_PROMPT);
    match llm.chat_completion(request).await {
        Ok(response) if !response.looks_like_error() => response
            .text
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect::<String>()
            .parse::<f32>()
            .unwrap_or(0.5)
            .clamp(0.0, 1.0),
        _ => 0.5,
    }
}

/// Embeds `text`, degrading to an empty vector on failure. `cosine_similarity`
/// treats length-mismatched vectors as 0.0, so a failed embed just drops out
/// of semantic dedup/search instead of panicking the run.
async fn embed_or_empty(llm: &dyn LlmClient, text: &str) -> Vec<f32> {
    match llm.embed(text).await {
        Ok(embedding) => embedding,
        Err(error) => {
            warn!(%error, "embedding call failed; continuing without it");
            Vec::new()
        }
    }
}

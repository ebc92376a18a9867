use scoutdesk_llm::{ChatRequest, LlmClient};
use scoutdesk_memory::{ArchiveRecord, MemoryManager, Namespace, Reader};
use tracing::warn;
use uuid::Uuid;

use crate::schema::Insight;

const CROSS_NOTEBOOK_LIMIT: usize = 10;
const TOP_RESULTS: usize = 20;
const SHARED_ENTITY_SEARCH_LIMIT: usize = 20;
const OVERWATCH_PER_NOTEBOOK_LIMIT: usize = 3;
const OVERWATCH_SCORE_FLOOR: f32 = 0.5;

async fn embed_or_empty(llm: &dyn LlmClient, text: &str) -> Vec<f32> {
    match llm.embed(text).await {
        Ok(embedding) => embedding,
        Err(error) => {
            warn!(%error, "embedding call failed in cross-notebook search");
            Vec::new()
        }
    }
}

struct CrossHit {
    notebook_id: Uuid,
    content: String,
    score: f32,
}

/// One result line summarizing where a synthesis's supporting content came
/// from, citable in a user-facing reply.
#[derive(Debug, Clone)]
pub struct SynthesisSource {
    pub notebook_id: Uuid,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub synthesis: String,
    pub sources: Vec<SynthesisSource>,
    pub notebooks_searched: Vec<Uuid>,
}

/// Answers questions that span multiple notebooks. One archive search per
/// notebook, in the Supervisor's cross-notebook namespace, combined and
/// ranked before a single synthesis call (spec.md §4.4).
pub async fn synthesize_across_notebooks(
    llm: &dyn LlmClient,
    model: &str,
    personality: &str,
    memory: &mut MemoryManager,
    query: &str,
    notebook_ids: &[Uuid],
) -> SynthesisResult {
    let embedding = embed_or_empty(llm, query).await;

    let mut all_results = Vec::new();
    for &notebook_id in notebook_ids {
        let hits = memory.search_archive(Reader::Supervisor { cross_notebook: true }, &embedding, CROSS_NOTEBOOK_LIMIT, 0.0);
        for (id, score) in hits {
            if let Some(record) = memory.get_archive_record(id) {
                if record.source_notebook_id == Some(notebook_id) {
                    all_results.push(CrossHit { notebook_id, content: record.content.clone(), score });
                }
            }
        }
    }

    all_results.sort_by(|a, b| b.score.total_cmp(&a.score));
    all_results.truncate(TOP_RESULTS);

    if all_results.is_empty() {
        return SynthesisResult {
            synthesis: "No relevant content found across the specified notebooks.".to_string(),
            sources: Vec::new(),
            notebooks_searched: notebook_ids.to_vec(),
        };
    }

    let context = all_results
        .iter()
        .map(|r| format!("[Notebook {}]: {}", short_id(r.notebook_id), r.content.chars().take(500).collect::<String>()))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "Query: {query}\n\nContent from multiple notebooks:\n{context}\n\nProvide a synthesis that:\n\
1. Identifies common themes across notebooks\n\
2. Notes any contradictions or differences\n\
3. Highlights connections the user might not have noticed\n\n\
Be concise and cite which notebook each insight comes from."
    );
    let request = ChatRequest::new(prompt, model)
        .with_system(format!("You are a research curator. Personality: {personality}"))
        .with_temperature(0.5);

    let synthesis = match llm.chat_completion(request).await {
        Ok(response) if !response.looks_like_error() => response.text,
        Ok(response) => {
            warn!(response = %response.text, "cross-notebook synthesis returned an error-shaped response");
            "Unable to synthesize.".to_string()
        }
        Err(error) => {
            warn!(%error, "cross-notebook synthesis failed");
            format!("Error during synthesis: {error}")
        }
    };

    let record = ArchiveRecord {
        id: Uuid::new_v4(),
        namespace: Namespace::Supervisor,
        source_notebook_id: None,
        content: format!("Cross-notebook synthesis for: {query}\n\n{synthesis}"),
        content_type: "cross_notebook_synthesis".to_string(),
        source_type: "system".to_string(),
        topics: vec!["synthesis".to_string(), "cross_notebook".to_string()],
        entities: Vec::new(),
        importance: 0.5,
        created_at: chrono::Utc::now(),
        embedding: None,
    };
    if let Err(error) = memory.add_archive_record(record) {
        warn!(%error, "failed to persist cross-notebook synthesis record");
    }

    let sources = all_results.iter().take(5).map(|r| SynthesisSource { notebook_id: r.notebook_id, score: r.score }).collect();
    SynthesisResult { synthesis, sources, notebooks_searched: notebook_ids.to_vec() }
}

fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

/// Entities appearing in ≥2 notebooks become `cross_reference` insights
/// (spec.md §4.4). One archive search per notebook with a fixed
/// entity-discovery query, grouped by entity name.
pub fn discover_cross_workspace_patterns(memory: &mut MemoryManager, notebook_ids: &[Uuid]) -> Vec<Insight> {
    if notebook_ids.len() < 2 {
        return Vec::new();
    }

    let mut entity_notebooks: std::collections::HashMap<String, Vec<Uuid>> = std::collections::HashMap::new();
    for &notebook_id in notebook_ids {
        // Entity discovery doesn't depend on a learned embedding: every
        // archive record for this notebook is eligible, we just want the
        // `entities` field, so an all-zero query with min_similarity 0 and
        // a generous limit effectively enumerates the notebook.
        let hits = memory.search_archive(Reader::Gatherer { notebook_id }, &[], SHARED_ENTITY_SEARCH_LIMIT, -1.0);
        for (id, _) in hits {
            if let Some(record) = memory.get_archive_record(id) {
                for entity in &record.entities {
                    let notebooks = entity_notebooks.entry(entity.clone()).or_default();
                    if !notebooks.contains(&notebook_id) {
                        notebooks.push(notebook_id);
                    }
                }
            }
        }
    }

    entity_notebooks
        .into_iter()
        .filter(|(_, notebooks)| notebooks.len() >= 2)
        .map(|(entity, notebooks)| Insight {
            kind: "cross_reference".to_string(),
            summary: format!("'{entity}' appears in {} notebooks. Consider comparing perspectives.", notebooks.len()),
            notebook_ids: notebooks,
            entity: Some(entity),
        })
        .collect()
}

/// Checks whether a previously-discovered insight relates to the current
/// query, so the Supervisor can chime in without re-running discovery on
/// every message (spec.md §4.4 `surface_insight_if_relevant`).
pub fn surface_insight_if_relevant(insights: &[Insight], query: &str) -> Option<String> {
    let query_lower = query.to_lowercase();
    insights.iter().find_map(|insight| {
        let entity = insight.entity.as_ref()?;
        query_lower.contains(&entity.to_lowercase()).then(|| format!("By the way: {}", insight.summary))
    })
}

/// After a regular chat answer, decides whether the Supervisor should chime
/// in with a cross-notebook connection. Searches every other notebook,
/// keeps hits scoring above the floor, then asks a model whether the
/// connection is genuinely useful — "SKIP" (or a degenerate length) means
/// no aside is shown (spec.md §4.4).
pub async fn generate_overwatch_aside(
    llm: &dyn LlmClient,
    model: &str,
    personality: &str,
    memory: &mut MemoryManager,
    query: &str,
    answer: &str,
    notebook_id: Uuid,
    all_notebook_ids: &[Uuid],
) -> Option<String> {
    let others: Vec<Uuid> = all_notebook_ids.iter().copied().filter(|id| *id != notebook_id).collect();
    if others.is_empty() {
        return None;
    }

    let embedding = embed_or_empty(llm, query).await;
    let mut cross_hits = Vec::new();
    for &other in &others {
        let hits = memory.search_archive(Reader::Supervisor { cross_notebook: true }, &embedding, OVERWATCH_PER_NOTEBOOK_LIMIT, OVERWATCH_SCORE_FLOOR);
        for (id, score) in hits {
            if let Some(record) = memory.get_archive_record(id) {
                if record.source_notebook_id == Some(other) && score > OVERWATCH_SCORE_FLOOR {
                    cross_hits.push(CrossHit { notebook_id: other, content: record.content.chars().take(200).collect(), score });
                }
            }
        }
    }

    if cross_hits.is_empty() {
        return None;
    }

    cross_hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    let cross_summary = cross_hits
        .iter()
        .take(5)
        .map(|h| format!("- [{}] {}", short_id(h.notebook_id), h.content))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "The user asked: \"{}\"\nThe answer discussed: {}\n\n\
Related content found in OTHER notebooks:\n{cross_summary}\n\n\
Is there a genuinely useful cross-notebook connection here? If YES, write a brief 1-2 sentence aside that \
adds value. If the connection is weak or obvious, respond with exactly \"SKIP\".\n\n\
Rules:\n\
- Only surface connections that the user likely hasn't noticed\n\
- Be specific about which notebook the connection comes from\n\
- Be concise — this is a sidebar note, not a full response",
        query.chars().take(200).collect::<String>(),
        answer.chars().take(300).collect::<String>(),
    );
    let request = ChatRequest::new(prompt, model)
        .with_system(format!(
            "You are a research curator with personality: {personality}. Only speak up when you have something genuinely useful to add."
        ))
        .with_temperature(0.3)
        .with_timeout(std::time::Duration::from_secs(15));

    match llm.chat_completion(request).await {
        Ok(response) if !response.looks_like_error() => {
            let text = response.text.trim().to_string();
            if !text.is_empty() && !text.to_uppercase().contains("SKIP") && text.len() > 10 && text.len() < 500 {
                Some(text)
            } else {
                None
            }
        }
        Ok(_) => None,
        Err(error) => {
            warn!(%error, "overwatch aside generation failed");
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct CounterargumentResult {
    pub inferred_thesis: String,
    pub counterpoints: Vec<(String, String, f32)>,
    pub confidence: f32,
}

const THESIS_SEARCH_LIMIT: usize = 10;
const COUNTER_QUERY_SEARCH_LIMIT: usize = 5;
const COUNTER_QUERY_COUNT: usize = 3;

async fn infer_thesis(llm: &dyn LlmClient, model: &str, memory: &mut MemoryManager, notebook_id: Uuid) -> String {
    let hits = memory.search_archive(Reader::Gatherer { notebook_id }, &[], THESIS_SEARCH_LIMIT, -1.0);
    if hits.is_empty() {
        return "Unable to infer thesis from notebook content.".to_string();
    }
    let context = hits
        .iter()
        .filter_map(|(id, _)| memory.get_archive_record(*id))
        .map(|record| record.content.chars().take(300).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "Based on this research content, what is the main thesis or hypothesis being explored?\n\nContent:\n{context}\n\n\
State the thesis in one clear sentence."
    );
    let request = ChatRequest::new(prompt, model).with_temperature(0.3);
    match llm.chat_completion(request).await {
        Ok(response) if !response.looks_like_error() => response.text,
        _ => "Unable to infer thesis.".to_string(),
    }
}

async fn generate_counter_queries(llm: &dyn LlmClient, model: &str, thesis: &str) -> Vec<String> {
    let prompt = format!(
        "Given this thesis: \"{thesis}\"\n\nGenerate 3 search queries that would find contradicting evidence or \
alternative perspectives.\nReturn only the queries, one per line."
    );
    let request = ChatRequest::new(prompt, model).with_temperature(0.5);
    match llm.chat_completion(request).await {
        Ok(response) if !response.looks_like_error() => {
            let queries: Vec<String> = response.text.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect();
            if queries.is_empty() {
                default_counter_queries(thesis)
            } else {
                queries.into_iter().take(COUNTER_QUERY_COUNT).collect()
            }
        }
        _ => default_counter_queries(thesis),
    }
}

fn default_counter_queries(thesis: &str) -> Vec<String> {
    vec![format!("evidence against {thesis}"), format!("criticism of {thesis}")]
}

/// Finds evidence against a thesis — either user-supplied or inferred from
/// the notebook's own content — by searching for contradicting angles
/// generated by the model (spec.md §4.4 "Devil's Advocate").
pub async fn find_counterarguments(
    llm: &dyn LlmClient,
    model: &str,
    memory: &mut MemoryManager,
    notebook_id: Uuid,
    thesis: Option<String>,
) -> CounterargumentResult {
    let thesis = match thesis {
        Some(t) if !t.trim().is_empty() => t,
        _ => infer_thesis(llm, model, memory, notebook_id).await,
    };
    let counter_queries = generate_counter_queries(llm, model, &thesis).await;

    let mut counterpoints = Vec::new();
    for query in &counter_queries {
        let embedding = embed_or_empty(llm, query).await;
        let hits = memory.search_archive(Reader::Gatherer { notebook_id }, &embedding, COUNTER_QUERY_SEARCH_LIMIT, 0.0);
        for (id, score) in hits {
            if let Some(record) = memory.get_archive_record(id) {
                counterpoints.push((query.clone(), record.content.chars().take(300).collect::<String>(), score));
            }
        }
    }
    counterpoints.sort_by(|a, b| b.2.total_cmp(&a.2));
    counterpoints.truncate(5);

    let confidence = if counterpoints.is_empty() { 0.3 } else { 0.6 };
    CounterargumentResult { inferred_thesis: thesis, counterpoints, confidence }
}

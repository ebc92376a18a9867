use scoutdesk_llm::{ChatRequest, LlmClient};
use scoutdesk_memory::{MemoryManager, Reader};
use tracing::warn;
use uuid::Uuid;

const NOTEBOOK_CONTEXT_LIMIT: usize = 10;
const CROSS_NOTEBOOK_LIMIT: usize = 5;
const CROSS_NOTEBOOK_SCORE_FLOOR: f32 = 0.3;
const HISTORY_LIMIT: usize = 6;

/// One turn of conversation history, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

async fn embed_or_empty(llm: &dyn LlmClient, text: &str) -> Vec<f32> {
    match llm.embed(text).await {
        Ok(embedding) => embedding,
        Err(error) => {
            warn!(%error, "embedding call failed during conversational reply");
            Vec::new()
        }
    }
}

/// Handles a conversational message in the global, cross-notebook-aware
/// chat surface: builds notebook context, searches the current notebook
/// plus other notebooks for relevant passages, and asks the model for a
/// short, personality-flavored reply (spec.md §4.4).
#[allow(clippy::too_many_arguments)]
pub async fn conversational_reply(
    llm: &dyn LlmClient,
    model: &str,
    personality: &str,
    memory: &mut MemoryManager,
    message: &str,
    notebook_id: Option<Uuid>,
    notebooks: &[(Uuid, String)],
    history: &[HistoryTurn],
) -> String {
    let notebook_context = if notebooks.is_empty() {
        String::new()
    } else {
        let lines: Vec<String> = notebooks
            .iter()
            .take(NOTEBOOK_CONTEXT_LIMIT)
            .map(|(id, name)| format!("- {name} (id: {}...)", id.to_string().chars().take(8).collect::<String>()))
            .collect();
        format!("Available notebooks:\n{}", lines.join("\n"))
    };

    let embedding = embed_or_empty(llm, message).await;

    let mut search_context = String::new();
    if let Some(notebook_id) = notebook_id {
        let hits = memory.search_archive(Reader::Gatherer { notebook_id }, &embedding, 5, 0.0);
        if !hits.is_empty() {
            let lines: Vec<String> = hits
                .iter()
                .filter_map(|(id, _)| memory.get_archive_record(*id))
                .map(|record| format!("- {}", record.content.chars().take(200).collect::<String>()))
                .collect();
            if !lines.is_empty() {
                search_context = format!("\nRelevant content from current notebook:\n{}", lines.join("\n"));
            }
        }
    }

    let mut cross_context = String::new();
    if notebooks.len() > 1 {
        let mut lines = Vec::new();
        for (id, name) in notebooks.iter().take(5) {
            if Some(*id) == notebook_id {
                continue;
            }
            let hits = memory.search_archive(Reader::Supervisor { cross_notebook: true }, &embedding, CROSS_NOTEBOOK_LIMIT, CROSS_NOTEBOOK_SCORE_FLOOR);
            for (record_id, score) in hits {
                if score <= CROSS_NOTEBOOK_SCORE_FLOOR {
                    continue;
                }
                if let Some(record) = memory.get_archive_record(record_id) {
                    if record.source_notebook_id == Some(*id) {
                        lines.push(format!("- [{name}]: {}", record.content.chars().take(200).collect::<String>()));
                    }
                }
            }
        }
        if !lines.is_empty() {
            cross_context = format!("\nCross-notebook connections:\n{}", lines.join("\n"));
        }
    }

    let history_text = history
        .iter()
        .rev()
        .take(HISTORY_LIMIT)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map(|turn| format!("\n{}: {}", turn.role.to_uppercase(), turn.content.chars().take(500).collect::<String>()))
        .collect::<String>();

    let system_prompt = format!(
        "You are a research curator for a notebook-based research system.\nYour personality: {personality}\n\n\
Your role:\n\
- You oversee ALL notebooks and have cross-notebook awareness\n\
- You can synthesize information across research areas\n\
- You can play devil's advocate and find counterarguments\n\
- You advise on research strategy and identify gaps\n\
- You are a guide and advisor, not a search engine\n\n\
{notebook_context}\n{search_context}\n{cross_context}\n\n\
Rules:\n\
- Be conversational and concise (2-4 sentences typical)\n\
- Proactively mention cross-notebook connections when relevant\n\
- If you don't have the information, say so honestly\n\
- Sign off naturally, no forced personality"
    );

    let prompt = if history_text.is_empty() {
        message.to_string()
    } else {
        format!("Conversation so far:{history_text}\n\nUSER: {message}")
    };

    let request = ChatRequest::new(prompt, model).with_system(system_prompt).with_temperature(0.5);
    match llm.chat_completion(request).await {
        Ok(response) if !response.looks_like_error() => response.text,
        Ok(_) => "I'm having trouble processing that right now.".to_string(),
        Err(error) => {
            warn!(%error, "conversational reply failed");
            "I'm experiencing a technical issue. Please try again.".to_string()
        }
    }
}

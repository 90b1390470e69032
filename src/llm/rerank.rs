use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;

use crate::config::SuggestParams;
use crate::llm::json::extract_array;
use crate::llm::{ChatMessage, CompletionOptions, TextCompletion};
use crate::models::QueryRecord;
use crate::suggest::suggest_similar_topics_with;

pub const DEFAULT_RERANK_TIMEOUT: Duration = Duration::from_millis(2500);

/// Heuristic suggestions, optionally reordered by the model.
///
/// The model is only consulted once the history is long enough and the
/// heuristic already found a few candidates. Any failure (timeout, transport
/// error, malformed or out-of-set reply) falls back to the heuristic list, so
/// this never errors.
pub async fn suggest_similar_topics_async(
    llm: &dyn TextCompletion,
    history: &[QueryRecord],
    max: usize,
) -> Vec<String> {
    suggest_similar_topics_async_with(
        llm,
        history,
        max,
        &SuggestParams::default(),
        DEFAULT_RERANK_TIMEOUT,
    )
    .await
}

pub async fn suggest_similar_topics_async_with(
    llm: &dyn TextCompletion,
    history: &[QueryRecord],
    max: usize,
    params: &SuggestParams,
    timeout: Duration,
) -> Vec<String> {
    let shortlist_len = (max + 2).clamp(4, 8);
    let mut heuristic = suggest_similar_topics_with(history, shortlist_len, params);

    if history.len() >= params.min_history_for_rerank && heuristic.len() >= max.min(3) && max > 0 {
        let recent: Vec<&str> = history.iter().take(5).map(|h| h.query.as_str()).collect();
        match tokio::time::timeout(timeout, rerank_topics(llm, &heuristic, &recent, max)).await {
            Ok(Ok(Some(reranked))) => {
                tracing::debug!("Suggestions re-ranked: {:?}", reranked);
                return reranked;
            }
            Ok(Ok(None)) => tracing::warn!("Re-ranker reply rejected, using heuristic order"),
            Ok(Err(e)) => tracing::warn!("Suggestion re-ranking failed: {e:#}"),
            Err(_) => tracing::warn!("Suggestion re-ranking timed out after {timeout:?}"),
        }
    }

    heuristic.truncate(max);
    heuristic
}

/// Ask the model to pick and order up to `max` of `candidates`.
///
/// `Ok(None)` means the reply was unusable: not a JSON array of strings,
/// containing a string outside the candidate set, or empty.
async fn rerank_topics(
    llm: &dyn TextCompletion,
    candidates: &[String],
    recent_queries: &[&str],
    max: usize,
) -> Result<Option<Vec<String>>> {
    if candidates.is_empty() {
        return Ok(None);
    }

    let prompt = build_rerank_prompt(candidates, recent_queries, max);
    let reply = llm
        .complete(
            vec![ChatMessage::user(prompt)],
            CompletionOptions {
                temperature: 0.0,
                max_tokens: 200,
            },
        )
        .await?;

    Ok(parse_reranked(&reply.content, candidates, max))
}

fn build_rerank_prompt(candidates: &[String], recent_queries: &[&str], max: usize) -> String {
    let mut lines = vec![
        "You are ranking search suggestions for a Torah study app.".to_string(),
        "Given the user's recent queries, choose the most semantically similar candidates.".to_string(),
        "Rules:".to_string(),
        "- Return ONLY a JSON array of up to N strings.".to_string(),
        "- Each string MUST be exactly one of the candidates provided.".to_string(),
        "- Do not add explanations.".to_string(),
        String::new(),
        format!("N = {max}"),
        "Recent queries:".to_string(),
    ];
    lines.extend(recent_queries.iter().map(|q| format!("- {q}")));
    lines.push(String::new());
    lines.push("Candidates:".to_string());
    lines.extend(
        candidates
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}. {c}", i + 1)),
    );
    lines.push(String::new());
    lines.push("Return JSON only, e.g.: [\"...\",\"...\"]".to_string());
    lines.join("\n")
}

fn parse_reranked(content: &str, candidates: &[String], max: usize) -> Option<Vec<String>> {
    let items = extract_array(content)?;
    let allowed: HashSet<&str> = candidates.iter().map(String::as_str).collect();

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in &items {
        let s = item.as_str()?;
        if !allowed.contains(s) {
            return None;
        }
        if seen.insert(s) && out.len() < max {
            out.push(s.to_string());
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

//! Topic suggestions derived from the user's own search history.
//!
//! The heuristic blends recency, frequency and domain-keyword salience into a
//! candidate pool, then keeps the candidates that overlap lexically with the
//! theme of the most recent queries. [`crate::llm::rerank`] optionally asks the
//! model to reorder the shortlist.

pub mod candidates;

use std::collections::HashSet;

use crate::config::SuggestParams;
use crate::models::QueryRecord;
use crate::text::normalize;

pub use candidates::{build_candidates, build_theme, jaccard, Candidate, CandidateKind};

const RECENT_TOPICS_LIMIT: usize = 8;

/// Up to `max` topics similar to what the user has been searching for.
pub fn suggest_similar_topics(history: &[QueryRecord], max: usize) -> Vec<String> {
    suggest_similar_topics_with(history, max, &SuggestParams::default())
}

pub fn suggest_similar_topics_with(
    history: &[QueryRecord],
    max: usize,
    params: &SuggestParams,
) -> Vec<String> {
    if history.is_empty() || max == 0 {
        return Vec::new();
    }

    let pool = build_candidates(history, params);
    let theme = build_theme(history, params.theme_window);

    // Full queries always pass so recent searches stay reachable.
    let mut accepted: Vec<(Candidate, f64)> = pool
        .into_iter()
        .filter_map(|c| {
            let sim = jaccard(&c.signature(), &theme);
            (sim >= params.similarity_threshold || c.kind == CandidateKind::Full).then_some((c, sim))
        })
        .collect();

    let mut seen = HashSet::new();
    accepted.retain(|(c, _)| seen.insert(normalize(&c.text)));

    accepted.sort_by(|(a, sim_a), (b, sim_b)| {
        sim_b
            .partial_cmp(sim_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.last_timestamp.cmp(&a.last_timestamp))
            .then_with(|| kind_rank(a.kind).cmp(&kind_rank(b.kind)))
    });

    accepted.into_iter().take(max).map(|(c, _)| c.text).collect()
}

fn kind_rank(kind: CandidateKind) -> u8 {
    match kind {
        CandidateKind::Full => 0,
        CandidateKind::Phrase => 1,
    }
}

/// Distinct recent queries (case-insensitive), newest first.
pub fn recent_topics(history: &[QueryRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    history
        .iter()
        .map(|h| h.query.trim())
        .filter(|q| !q.is_empty() && seen.insert(q.to_lowercase()))
        .take(RECENT_TOPICS_LIMIT)
        .map(str::to_string)
        .collect()
}

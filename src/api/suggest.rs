use axum::extract::{Query, State};
use axum::Json;

use crate::llm::rerank::suggest_similar_topics_async_with;
use crate::models::{SuggestionQuery, SuggestionResponse};
use crate::state::AppState;
use crate::suggest::{recent_topics, suggest_similar_topics_with};

const MAX_SUGGESTIONS: usize = 20;

/// GET /api/suggestions?max=&refine= - Topics similar to the user's history.
/// With `refine`, the heuristic shortlist is re-ranked by the LLM.
pub async fn suggestions(
    State(state): State<AppState>,
    Query(params): Query<SuggestionQuery>,
) -> Json<SuggestionResponse> {
    let max = params.max.min(MAX_SUGGESTIONS);
    let history = state.library.read().history.clone();

    let suggestions = if params.refine {
        suggest_similar_topics_async_with(
            state.llm.as_ref(),
            &history,
            max,
            &state.config.suggest,
            state.config.ai_timeout(),
        )
        .await
    } else {
        suggest_similar_topics_with(&history, max, &state.config.suggest)
    };

    Json(SuggestionResponse { suggestions })
}

/// GET /api/topics/recent
pub async fn recent(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(recent_topics(&state.library.read().history))
}

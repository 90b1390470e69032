use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::llm::sources::search_torah_sources;
use crate::models::{new_id, now_ms, QueryRecord, SearchRequest, SearchResponse};
use crate::state::AppState;

/// POST /api/search - Retrieve sources for a question:
///   1. Fill number of sources / language from stored preferences
///   2. One LLM call with the era distribution and language instruction
///   3. Validate and sanitize the returned citations
///   4. Record the search in history
pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let query = req.query.trim().to_string();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query is required".to_string()));
    }

    let (number_of_sources, language) = {
        let prefs = state.preferences.read();
        let mut effective = prefs.clone();
        if let Some(n) = req.number_of_sources {
            effective.set_number_of_sources(n);
        }
        (effective.number_of_sources, req.language.unwrap_or(prefs.language))
    };

    tracing::info!("Searching sources for \"{}\" ({} sources)", query, number_of_sources);

    let sources = search_torah_sources(state.llm.as_ref(), &query, number_of_sources, language)
        .await
        .map_err(|e| {
            tracing::warn!("Source retrieval failed: {e:#}");
            (StatusCode::BAD_GATEWAY, format!("Source retrieval failed: {e}"))
        })?;

    let record = QueryRecord {
        id: new_id(),
        query,
        sources,
        timestamp: now_ms(),
        language,
    };

    state.library.write().add_to_history(record.clone());
    state.persist_library();

    Ok(Json(SearchResponse { record }))
}

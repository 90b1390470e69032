use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::calendar::{fetch_todays_daf, DafInfo};
use crate::llm::chabura::{
    compile_chabura_outline, compile_clarifying_questions, ChaburaTemplate, DEFAULT_TOTAL_SOURCES,
};
use crate::models::{ChaburaRequest, ChaburaResponse, QuestionsRequest, QuestionsResponse};
use crate::state::AppState;

/// POST /api/chabura - Compile a sectioned outline, resolving the template
/// (and today's daf for the daf template) first.
pub async fn outline(
    State(state): State<AppState>,
    Json(req): Json<ChaburaRequest>,
) -> Result<Json<ChaburaResponse>, (StatusCode, String)> {
    let daf = if req.template == ChaburaTemplate::Daf {
        fetch_todays_daf(&state.http_client, &state.config.calendar_url).await
    } else {
        None
    };

    let (topic, extra) = req
        .template
        .resolve(&req.topic, req.ui_language, daf.as_ref())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "Topic is required".to_string()))?;

    let total = req.total_sources.unwrap_or(DEFAULT_TOTAL_SOURCES).clamp(1, 50);
    tracing::info!("Compiling chabura on \"{}\" ({:?})", topic, req.template);

    let outline = compile_chabura_outline(state.llm.as_ref(), &topic, total, &extra)
        .await
        .map_err(|e| {
            tracing::warn!("Chabura outline failed: {e:#}");
            (StatusCode::BAD_GATEWAY, format!("Chabura outline failed: {e}"))
        })?;

    Ok(Json(ChaburaResponse { topic, outline }))
}

/// POST /api/chabura/questions
pub async fn questions(
    State(state): State<AppState>,
    Json(req): Json<QuestionsRequest>,
) -> Result<Json<QuestionsResponse>, (StatusCode, String)> {
    let topic = req.topic.trim();
    if topic.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Topic is required".to_string()));
    }
    let questions = compile_clarifying_questions(state.llm.as_ref(), topic, req.ui_language).await;
    Ok(Json(QuestionsResponse { questions }))
}

/// GET /api/daf - Today's Daf Yomi, `null` when the calendar is unavailable
pub async fn todays_daf(State(state): State<AppState>) -> Json<Option<DafInfo>> {
    Json(fetch_todays_daf(&state.http_client, &state.config.calendar_url).await)
}

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::models::{AssignRequest, Folder, FolderRequest, FoldersResponse, QueryRecord, Source};
use crate::store::Preferences;
use crate::state::AppState;

/// GET /api/history - Past searches, newest first
pub async fn list_history(State(state): State<AppState>) -> Json<Vec<QueryRecord>> {
    Json(state.library.read().history.clone())
}

/// DELETE /api/history
pub async fn clear_history(State(state): State<AppState>) -> StatusCode {
    state.library.write().clear_history();
    state.persist_library();
    tracing::info!("History cleared");
    StatusCode::NO_CONTENT
}

/// GET /api/favorites
pub async fn list_favorites(State(state): State<AppState>) -> Json<Vec<Source>> {
    Json(state.library.read().favorites.clone())
}

/// POST /api/favorites - Adding an existing id is a no-op
pub async fn add_favorite(
    State(state): State<AppState>,
    Json(source): Json<Source>,
) -> Result<(StatusCode, Json<Source>), (StatusCode, String)> {
    if source.id.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Source id is required".to_string()));
    }

    let added = state.library.write().add_favorite(source.clone());
    if !added {
        return Ok((StatusCode::OK, Json(source)));
    }
    state.persist_library();
    Ok((StatusCode::CREATED, Json(source)))
}

/// DELETE /api/favorites/{id}
pub async fn remove_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let removed = state.library.write().remove_favorite(&id);
    if !removed {
        return Err((StatusCode::NOT_FOUND, "Favorite not found".to_string()));
    }
    state.persist_library();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/folders - Folders and the source assignments
pub async fn list_folders(State(state): State<AppState>) -> Json<FoldersResponse> {
    let library = state.library.read();
    Json(FoldersResponse {
        folders: library.folders.clone(),
        assignments: library.source_folders.clone(),
    })
}

/// POST /api/folders
pub async fn create_folder(
    State(state): State<AppState>,
    Json(req): Json<FolderRequest>,
) -> Result<(StatusCode, Json<Folder>), (StatusCode, String)> {
    let folder = state
        .library
        .write()
        .create_folder(&req.name)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    state.persist_library();
    Ok((StatusCode::CREATED, Json(folder)))
}

/// PUT /api/folders/assign/{source_id}
pub async fn assign_to_folder(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
    Json(req): Json<AssignRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .library
        .write()
        .assign_to_folder(&source_id, &req.folder_id)
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))?;
    state.persist_library();
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/folders/assign/{source_id}
pub async fn remove_from_folder(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
) -> StatusCode {
    if state.library.write().remove_from_folder(&source_id) {
        state.persist_library();
    }
    StatusCode::NO_CONTENT
}

/// GET /api/preferences
pub async fn get_preferences(State(state): State<AppState>) -> Json<Preferences> {
    Json(state.preferences.read().clone())
}

/// PUT /api/preferences - Out-of-range values are clamped, not rejected
pub async fn update_preferences(
    State(state): State<AppState>,
    Json(update): Json<Preferences>,
) -> Json<Preferences> {
    let prefs = update.sanitized();
    *state.preferences.write() = prefs.clone();
    state.persist_preferences();
    tracing::info!(
        "Preferences updated: language={:?}, sources={}",
        prefs.language,
        prefs.number_of_sources
    );
    Json(prefs)
}

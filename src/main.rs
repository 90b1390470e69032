use axum::routing::{get, post, put};
use axum::Router;
use tracing_subscriber::EnvFilter;

use mafteiach::api;
use mafteiach::config::Config;
use mafteiach::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);

    let state = AppState::new(config.clone())?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/search", post(api::search::search))
        .route(
            "/api/history",
            get(api::library::list_history).delete(api::library::clear_history),
        )
        .route("/api/suggestions", get(api::suggest::suggestions))
        .route("/api/topics/recent", get(api::suggest::recent))
        .route(
            "/api/favorites",
            get(api::library::list_favorites).post(api::library::add_favorite),
        )
        .route(
            "/api/favorites/{id}",
            axum::routing::delete(api::library::remove_favorite),
        )
        .route(
            "/api/folders",
            get(api::library::list_folders).post(api::library::create_folder),
        )
        .route(
            "/api/folders/assign/{source_id}",
            put(api::library::assign_to_folder).delete(api::library::remove_from_folder),
        )
        .route("/api/graph", post(api::graph::build_graph))
        .route("/api/chabura", post(api::chabura::outline))
        .route("/api/chabura/questions", post(api::chabura::questions))
        .route("/api/daf", get(api::chabura::todays_daf))
        .route(
            "/api/preferences",
            get(api::library::get_preferences).put(api::library::update_preferences),
        )
        .with_state(state)
}

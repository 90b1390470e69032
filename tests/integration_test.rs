//! Integration tests for the mafteiach service.
//!
//! Handlers are called directly with a canned completion backend, so no LLM
//! or network is needed. State is persisted to a temp dir.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use mafteiach::api;
use mafteiach::config::Config;
use mafteiach::graph::{build_sugya_graph, layout_graph, EdgeType, Era, Viewport};
use mafteiach::llm::{ChatMessage, Completion, CompletionOptions, TextCompletion};
use mafteiach::models::{
    AssignRequest, Category, ChaburaRequest, FolderRequest, GraphRequest, Language, QueryRecord,
    SearchRequest, Source, SourceLanguage, SuggestionQuery,
};
use mafteiach::state::AppState;
use mafteiach::store::Preferences;
use mafteiach::suggest::suggest_similar_topics_with;

/// Replies with the same text every time, or fails when `reply` is `None`.
struct CannedLlm {
    reply: Option<String>,
    calls: AtomicUsize,
}

impl CannedLlm {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn offline() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TextCompletion for CannedLlm {
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> anyhow::Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(content) => Ok(Completion {
                content: content.clone(),
            }),
            None => anyhow::bail!("connection refused"),
        }
    }
}

fn test_config(dir: &tempfile::TempDir) -> Config {
    Config {
        data_dir: dir.path().to_path_buf(),
        // Nothing listens here, so calendar lookups fail fast
        calendar_url: "http://127.0.0.1:1/api/calendars".to_string(),
        ..Config::default()
    }
}

fn state_with(dir: &tempfile::TempDir, llm: Arc<CannedLlm>) -> AppState {
    AppState::with_llm(test_config(dir), reqwest::Client::new(), llm).unwrap()
}

fn source(id: &str, category: Category, title: &str, location: &str, text: &str) -> Source {
    Source {
        id: id.to_string(),
        title: title.to_string(),
        location: location.to_string(),
        text: text.to_string(),
        category,
        language: SourceLanguage::English,
        timestamp: 0,
    }
}

fn record(query: &str, timestamp: i64) -> QueryRecord {
    QueryRecord {
        id: format!("q{timestamp}"),
        query: query.to_string(),
        sources: Vec::new(),
        timestamp,
        language: Language::Both,
    }
}

/// A small sugya: a gemara, a mishnah, two halachic sources (one disputing).
fn sample_sugya() -> Vec<Source> {
    let text = "candles lit before sunset friday evening household lamp";
    vec![
        source("g1", Category::Gemara, "Shabbat", "23b", text),
        source("m1", Category::Mishnah, "Mishnah Shabbat", "2:6", "women are careful with lamp"),
        source("h1", Category::Halacha, "Shulchan Aruch", "OC 263:2", text),
        source(
            "h2",
            Category::Halacha,
            "Mishnah Berurah",
            "263:10",
            "candles lit before sunset friday evening household lamp but not after",
        ),
    ]
}

#[test]
fn test_end_to_end_graph_and_layout() {
    let sources = sample_sugya();
    let graph = build_sugya_graph(&sources);

    let eras: Vec<Era> = graph.nodes.iter().map(|n| n.era).collect();
    assert!(eras.contains(&Era::Gemara) && eras.contains(&Era::Mishnah) && eras.contains(&Era::Halacha));

    // Cross-era overlap: gemara -> halacha, typed by the later source's text
    let g_h1 = graph.edges.iter().find(|e| e.from == "g1" && e.to == "h1").unwrap();
    assert_eq!(g_h1.edge_type, EdgeType::Support);
    let g_h2 = graph.edges.iter().find(|e| e.from == "g1" && e.to == "h2").unwrap();
    assert_eq!(g_h2.edge_type, EdgeType::Argue);

    let layout = layout_graph(&graph.nodes, &graph.edges, Viewport::default());
    assert_eq!(layout.nodes.len(), sources.len());
    assert_eq!(layout.edges.len(), graph.edges.len());
    assert!(layout.bounds.width >= 360.0 && layout.bounds.height >= 480.0);

    // Same input, same picture
    let again = layout_graph(&graph.nodes, &graph.edges, Viewport::default());
    assert_eq!(layout, again);
}

#[test]
fn test_shared_tokens_link_gemara_to_halacha() {
    let text = "dogs cats birds fish trees rocks";
    let sources = vec![
        source("a", Category::Gemara, "X", "Berachot 2a", text),
        source("b", Category::Halacha, "Y", "OC 4:1", text),
    ];
    let graph = build_sugya_graph(&sources);
    assert_eq!(graph.edges.len(), 1);
    let edge = &graph.edges[0];
    assert_eq!((edge.from.as_str(), edge.to.as_str()), ("a", "b"));
    assert_eq!(edge.edge_type, EdgeType::Support);
    assert_eq!(edge.confidence, 0.55);
}

#[tokio::test]
async fn test_graph_handler_uses_ai_edges() {
    let dir = tempfile::tempdir().unwrap();
    let llm = CannedLlm::replying(r#"{"edges": [{"from": "m1", "to": "h1", "type": "quote", "confidence": 0.7}]}"#);
    let state = state_with(&dir, llm.clone());

    let req = GraphRequest {
        sources: sample_sugya(),
        viewport: Viewport::default(),
        enhance: true,
        max_targets: 20,
    };
    let Json(resp) = api::graph::build_graph(State(state), Json(req)).await;

    assert!(resp.enhanced);
    assert_eq!(resp.graph.edges.len(), 1);
    assert_eq!(resp.graph.edges[0].edge_type, EdgeType::Quote);
    assert_eq!(resp.layout.edges.len(), 1);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_graph_handler_keeps_edges_beyond_max_targets() {
    let dir = tempfile::tempdir().unwrap();
    let llm = CannedLlm::replying(r#"{"edges": [{"from": "g1", "to": "m1", "type": "support", "confidence": 0.8}]}"#);
    let state = state_with(&dir, llm);
    let sources = sample_sugya();
    let heuristic = build_sugya_graph(&sources);

    let req = GraphRequest {
        sources,
        viewport: Viewport::default(),
        enhance: true,
        max_targets: 2,
    };
    let Json(resp) = api::graph::build_graph(State(state), Json(req)).await;

    assert!(resp.enhanced);
    assert!(resp.graph.edges.iter().any(|e| e.from == "g1" && e.to == "m1"));
    // h1/h2 were never sent to the model, so their heuristic edges survive
    for edge in heuristic.edges.iter().filter(|e| e.to == "h1" || e.to == "h2") {
        assert!(resp.graph.edges.contains(edge), "missing {edge:?}");
    }
    assert_eq!(resp.layout.edges.len(), resp.graph.edges.len());
}

#[tokio::test]
async fn test_graph_handler_keeps_heuristics_when_llm_fails() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with(&dir, CannedLlm::offline());
    let sources = sample_sugya();
    let heuristic = build_sugya_graph(&sources);

    let req = GraphRequest {
        sources,
        viewport: Viewport::default(),
        enhance: true,
        max_targets: 20,
    };
    let Json(resp) = api::graph::build_graph(State(state), Json(req)).await;

    assert!(!resp.enhanced);
    assert_eq!(resp.graph, heuristic);
}

#[tokio::test]
async fn test_search_records_history_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let llm = CannedLlm::replying(
        r#"Here are the sources:
[
  {"title": "Shabbat", "location": "23b", "text": "...", "category": "gemara", "language": "english"},
  {"title": "Shulchan Aruch", "location": "OC 263", "text": "...", "category": "Shulchan Aruch"},
  {"title": "No location"}
]"#,
    );
    let state = state_with(&dir, llm);

    let req = SearchRequest {
        query: "  Shabbat candle lighting ".to_string(),
        number_of_sources: Some(10),
        language: Some(Language::English),
    };
    let Json(resp) = api::search::search(State(state.clone()), Json(req)).await.unwrap();

    assert_eq!(resp.record.query, "Shabbat candle lighting");
    assert_eq!(resp.record.sources.len(), 2);
    assert_eq!(resp.record.sources[1].category, Category::Halacha);
    assert_eq!(state.library.read().history.len(), 1);

    // A fresh state over the same data dir sees the saved history
    let reloaded = state_with(&dir, CannedLlm::offline());
    assert_eq!(reloaded.library.read().history[0].query, "Shabbat candle lighting");
}

#[tokio::test]
async fn test_search_failure_is_bad_gateway_and_not_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with(&dir, CannedLlm::replying("I cannot answer that."));

    let req = SearchRequest {
        query: "eruv".to_string(),
        number_of_sources: None,
        language: None,
    };
    let (status, _) = api::search::search(State(state.clone()), Json(req)).await.unwrap_err();

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(state.library.read().history.is_empty());
}

#[tokio::test]
async fn test_refined_suggestions_follow_model_order() {
    let dir = tempfile::tempdir().unwrap();
    let history: Vec<QueryRecord> = [
        "shabbat candles timing",
        "eruv in apartment buildings",
        "muktzeh phone on shabbat",
        "kashrut of dishwashers",
        "tefillin in the rain",
        "shabbat candles timing",
        "pesach cleaning chametz",
        "sukkah on a balcony",
        "yom kippur fasting sick",
        "niddah counting",
        "tzedakah percentage",
        "shmitta produce",
    ]
    .iter()
    .enumerate()
    .map(|(i, q)| record(q, 1000 - i as i64))
    .collect();

    let config = test_config(&dir);
    let heuristic = suggest_similar_topics_with(&history, 6, &config.suggest);
    let reply = serde_json::to_string(&[&heuristic[2], &heuristic[0]]).unwrap();
    let state = state_with(&dir, CannedLlm::replying(&reply));
    state.library.write().history = history;

    let query = SuggestionQuery { max: 4, refine: true };
    let Json(resp) = api::suggest::suggestions(State(state.clone()), Query(query)).await;
    assert_eq!(resp.suggestions, vec![heuristic[2].clone(), heuristic[0].clone()]);

    let query = SuggestionQuery { max: 4, refine: false };
    let Json(resp) = api::suggest::suggestions(State(state.clone()), Query(query)).await;
    assert_eq!(resp.suggestions, heuristic[..4].to_vec());

    let Json(recent) = api::suggest::recent(State(state)).await;
    assert_eq!(recent.len(), 8);
    assert_eq!(recent[0], "shabbat candles timing");
}

#[tokio::test]
async fn test_favorites_and_folders_flow() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with(&dir, CannedLlm::offline());
    let fav = source("s1", Category::Gemara, "Shabbat", "23b", "");

    let (status, _) = api::library::add_favorite(State(state.clone()), Json(fav.clone())).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = api::library::add_favorite(State(state.clone()), Json(fav)).await.unwrap();
    assert_eq!(status, StatusCode::OK);

    let (_, Json(folder)) = api::library::create_folder(
        State(state.clone()),
        Json(FolderRequest {
            name: "Shabbat".to_string(),
        }),
    )
    .await
    .unwrap();

    let status = api::library::assign_to_folder(
        State(state.clone()),
        Path("s1".to_string()),
        Json(AssignRequest {
            folder_id: folder.id.clone(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let Json(listing) = api::library::list_folders(State(state.clone())).await;
    assert_eq!(listing.assignments.get("s1"), Some(&folder.id));

    let err = api::library::assign_to_folder(
        State(state.clone()),
        Path("s1".to_string()),
        Json(AssignRequest {
            folder_id: "nope".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);

    api::library::remove_favorite(State(state.clone()), Path("s1".to_string())).await.unwrap();
    let Json(favorites) = api::library::list_favorites(State(state.clone())).await;
    assert!(favorites.is_empty());
    let Json(listing) = api::library::list_folders(State(state)).await;
    assert!(listing.assignments.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_favorites_all_reach_disk() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with(&dir, CannedLlm::offline());

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let state = state.clone();
            let fav = source(&format!("s{i}"), Category::Halacha, "Shulchan Aruch", "OC 1:1", "");
            tokio::spawn(async move { api::library::add_favorite(State(state), Json(fav)).await })
        })
        .collect();
    for task in tasks {
        let (status, _) = task.await.unwrap().unwrap();
        assert_eq!(status, StatusCode::CREATED);
    }

    // Every save snapshots under the same lock, so the last file written is complete
    let reloaded = state_with(&dir, CannedLlm::offline());
    assert_eq!(reloaded.library.read().favorites.len(), 32);
    assert!(!dir.path().join("library.json.tmp").exists());
}

#[tokio::test]
async fn test_preferences_are_clamped_and_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with(&dir, CannedLlm::offline());

    let update = Preferences {
        language: Language::Hebrew,
        number_of_sources: 99,
        text_scale: 0.1,
        line_height: 1.5,
        justify_text: true,
    };
    let Json(saved) = api::library::update_preferences(State(state), Json(update)).await;
    assert_eq!(saved.number_of_sources, 50);
    assert_eq!(saved.text_scale, 0.8);

    let reloaded = state_with(&dir, CannedLlm::offline());
    assert_eq!(*reloaded.preferences.read(), saved);
}

#[tokio::test]
async fn test_chabura_outline_with_template() {
    let dir = tempfile::tempdir().unwrap();
    let llm = CannedLlm::replying(
        r#"{"introNoteHebrew": "מבוא", "sections": [{"titleHebrew": "גמרא", "sources": [{"title": "שבת", "location": "כג:"}]}]}"#,
    );
    let state = state_with(&dir, llm);

    let req = ChaburaRequest {
        topic: "נר חנוכה".to_string(),
        template: serde_json::from_str("\"practical\"").unwrap(),
        ui_language: SourceLanguage::Hebrew,
        total_sources: None,
    };
    let Json(resp) = api::chabura::outline(State(state), Json(req)).await.unwrap();
    assert_eq!(resp.topic, "נר חנוכה");
    assert_eq!(resp.outline.source_count(), 1);
    assert_eq!(resp.outline.sections[0].sources[0].language, SourceLanguage::Hebrew);
}

#[tokio::test]
async fn test_daf_template_without_calendar_needs_topic() {
    let dir = tempfile::tempdir().unwrap();
    let llm = CannedLlm::replying("{}");
    let state = state_with(&dir, llm.clone());

    let req = ChaburaRequest {
        topic: String::new(),
        template: serde_json::from_str("\"daf\"").unwrap(),
        ui_language: SourceLanguage::English,
        total_sources: None,
    };
    let (status, _) = api::chabura::outline(State(state), Json(req)).await.unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
}

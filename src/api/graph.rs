use axum::extract::State;
use axum::Json;

use crate::graph::{build_sugya_graph_with, layout_graph};
use crate::llm::edges::{enhance_edges_with_ai, merge_enhanced_edges};
use crate::models::{GraphRequest, GraphResponse};
use crate::state::AppState;

/// POST /api/graph - Build the sugya graph for a set of sources, optionally
/// let the LLM refine its edges, and lay it out for the given viewport.
pub async fn build_graph(
    State(state): State<AppState>,
    Json(req): Json<GraphRequest>,
) -> Json<GraphResponse> {
    let mut graph = build_sugya_graph_with(&req.sources, &state.config.graph);
    let mut enhanced = false;

    if req.enhance {
        let ai_edges = enhance_edges_with_ai(
            state.llm.as_ref(),
            &graph.nodes,
            &req.sources,
            &graph.edges,
            req.max_targets,
            state.config.ai_timeout(),
        )
        .await;
        // An empty reply keeps the heuristic edges
        if let Some(edges) = ai_edges.filter(|e| !e.is_empty()) {
            graph.edges = merge_enhanced_edges(&graph.nodes, &graph.edges, edges, req.max_targets);
            enhanced = true;
        }
    }

    let layout = layout_graph(&graph.nodes, &graph.edges, req.viewport);
    tracing::info!(
        "Graph: {} nodes, {} edges (enhanced: {})",
        graph.nodes.len(),
        graph.edges.len(),
        enhanced
    );

    Json(GraphResponse {
        graph,
        layout,
        enhanced,
    })
}

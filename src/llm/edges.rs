use std::collections::{HashMap, HashSet};
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::graph::{dedupe_edges, EdgeType, Era, GraphEdge, GraphNode};
use crate::llm::json::{extract_object, str_field};
use crate::llm::{ChatMessage, CompletionOptions, TextCompletion};
use crate::models::Source;
use crate::text::snippet;

pub const DEFAULT_MAX_TARGETS: usize = 20;
pub const DEFAULT_ENHANCE_TIMEOUT: Duration = Duration::from_millis(2500);

const SNIPPET_CHARS: usize = 400;
const DEFAULT_CONFIDENCE: f64 = 0.6;

#[derive(Debug, Serialize)]
struct EdgeItem<'a> {
    id: &'a str,
    title: &'a str,
    era: Era,
    snippet: String,
}

/// Ask the model for relationship edges between the first `max_targets`
/// nodes.
///
/// Returns `None` on any failure; callers keep their heuristic `edges` in
/// that case. The heuristic edges among the selected nodes are included in
/// the prompt as a starting point.
pub async fn enhance_edges_with_ai(
    llm: &dyn TextCompletion,
    nodes: &[GraphNode],
    sources: &[Source],
    edges: &[GraphEdge],
    max_targets: usize,
    timeout: Duration,
) -> Option<Vec<GraphEdge>> {
    let limited = &nodes[..nodes.len().min(max_targets)];
    if limited.is_empty() {
        return None;
    }

    match tokio::time::timeout(timeout, request_edges(llm, limited, sources, edges)).await {
        Ok(Ok(Some(enhanced))) => {
            tracing::info!("AI edge enhancement produced {} edges", enhanced.len());
            Some(enhanced)
        }
        Ok(Ok(None)) => {
            tracing::warn!("AI edge enhancement reply was not usable");
            None
        }
        Ok(Err(e)) => {
            tracing::warn!("AI edge enhancement failed: {e:#}");
            None
        }
        Err(_) => {
            tracing::warn!("AI edge enhancement timed out after {timeout:?}");
            None
        }
    }
}

async fn request_edges(
    llm: &dyn TextCompletion,
    nodes: &[GraphNode],
    sources: &[Source],
    edges: &[GraphEdge],
) -> Result<Option<Vec<GraphEdge>>> {
    let by_id: HashMap<&str, &Source> = sources.iter().map(|s| (s.id.as_str(), s)).collect();
    let items: Vec<EdgeItem> = nodes
        .iter()
        .map(|n| {
            let source = by_id.get(n.id.as_str());
            let title = source
                .map(|s| s.title.as_str())
                .filter(|t| !t.trim().is_empty())
                .or_else(|| {
                    source
                        .map(|s| s.location.as_str())
                        .filter(|l| !l.trim().is_empty())
                })
                .unwrap_or(n.label.as_str());
            EdgeItem {
                id: &n.id,
                title,
                era: n.era,
                snippet: source.map(|s| snippet(&s.text, SNIPPET_CHARS)).unwrap_or_default(),
            }
        })
        .collect();

    let ids: HashSet<&str> = items.iter().map(|i| i.id).collect();
    let known: Vec<&GraphEdge> = edges
        .iter()
        .filter(|e| ids.contains(e.from.as_str()) && ids.contains(e.to.as_str()))
        .collect();

    let prompt = [
        "You are mapping relationships between Torah sources (support, argue, quote).".to_string(),
        "Given items with id, era, title and snippet, return JSON edges strictly in this format:".to_string(),
        "{ \"edges\": [ { \"from\": id, \"to\": id, \"type\": \"support|argue|quote\", \"confidence\": 0..1 } ] }".to_string(),
        "Only use provided ids. Keep edges directional from earlier era to later era when possible.".to_string(),
        "Items:".to_string(),
        serde_json::to_string(&items)?,
        "Heuristic edges (refine, extend or drop):".to_string(),
        serde_json::to_string(&known)?,
    ]
    .join("\n");

    let reply = llm
        .complete(
            vec![ChatMessage::user(prompt)],
            CompletionOptions {
                temperature: 0.0,
                max_tokens: 500,
            },
        )
        .await?;

    Ok(parse_edges(&reply.content, &ids))
}

/// Combine refined edges with the heuristic ones the model never saw.
///
/// Heuristic edges between two of the first `max_targets` nodes are replaced
/// by `enhanced`; edges touching any later node are kept.
pub fn merge_enhanced_edges(
    nodes: &[GraphNode],
    heuristic: &[GraphEdge],
    enhanced: Vec<GraphEdge>,
    max_targets: usize,
) -> Vec<GraphEdge> {
    let covered: HashSet<&str> = nodes.iter().take(max_targets).map(|n| n.id.as_str()).collect();
    let kept = heuristic
        .iter()
        .filter(|e| !(covered.contains(e.from.as_str()) && covered.contains(e.to.as_str())))
        .cloned();
    dedupe_edges(enhanced.into_iter().chain(kept).collect())
}

/// Validate the model's `{"edges": [...]}` reply against the allowed ids.
fn parse_edges(content: &str, ids: &HashSet<&str>) -> Option<Vec<GraphEdge>> {
    let obj = extract_object(content)?;
    let raw = obj.get("edges")?.as_array()?;

    let mut out = Vec::with_capacity(raw.len());
    for e in raw {
        let (Some(from), Some(to)) = (str_field(e, "from"), str_field(e, "to")) else {
            continue;
        };
        if !ids.contains(from) || !ids.contains(to) || from == to {
            continue;
        }
        let edge_type = str_field(e, "type").map(EdgeType::from_label).unwrap_or(EdgeType::Quote);
        let confidence = e
            .get("confidence")
            .and_then(Value::as_f64)
            .map(|c| c.clamp(0.0, 1.0))
            .unwrap_or(DEFAULT_CONFIDENCE);
        out.push(GraphEdge {
            from: from.to_string(),
            to: to.to_string(),
            edge_type,
            confidence,
        });
    }
    Some(dedupe_edges(out))
}

use std::collections::{HashMap, HashSet};

use crate::config::GraphParams;
use crate::graph::{EdgeType, Era, GraphEdge, GraphNode, SugyaGraph, ERA_ORDER};
use crate::models::Source;
use crate::text::{ellipsize, has_negation, tokenize};

const LABEL_MAX_CHARS: usize = 28;

/// Build the relationship graph with the default thresholds.
pub fn build_sugya_graph(sources: &[Source]) -> SugyaGraph {
    build_sugya_graph_with(sources, &GraphParams::default())
}

/// Build the relationship graph for `sources`.
///
/// Edges come from two passes:
/// 1. Each era lane is chained in input order with `quote` edges.
/// 2. Every pair (a, b) with `era(a) <= era(b)` sharing at least
///    `min_shared_tokens` content tokens is linked a→b, as `argue` when b's
///    text carries a negation marker and `support` otherwise.
///
/// The combined list is reduced to one edge per ordered pair.
pub fn build_sugya_graph_with(sources: &[Source], params: &GraphParams) -> SugyaGraph {
    let nodes: Vec<GraphNode> = sources.iter().map(node_for).collect();

    let mut edges = Vec::new();

    // Lane chains
    for era in ERA_ORDER {
        let lane: Vec<&GraphNode> = nodes.iter().filter(|n| n.era == era).collect();
        for pair in lane.windows(2) {
            edges.push(GraphEdge {
                from: pair[0].id.clone(),
                to: pair[1].id.clone(),
                edge_type: EdgeType::Quote,
                confidence: params.chain_confidence,
            });
        }
    }

    // Lexical overlap, only forward (or level) in era order
    let token_sets: Vec<HashSet<String>> = sources.iter().map(source_tokens).collect();
    for (i, a) in nodes.iter().enumerate() {
        for (j, b) in nodes.iter().enumerate() {
            if a.id == b.id || a.era.index() > b.era.index() {
                continue;
            }
            let shared = token_sets[i].intersection(&token_sets[j]).count();
            if shared >= params.min_shared_tokens {
                let edge_type = if has_negation(&sources[j].text) {
                    EdgeType::Argue
                } else {
                    EdgeType::Support
                };
                edges.push(GraphEdge {
                    from: a.id.clone(),
                    to: b.id.clone(),
                    edge_type,
                    confidence: params.overlap_confidence,
                });
            }
        }
    }

    SugyaGraph {
        nodes,
        edges: dedupe_edges(edges),
    }
}

/// Keep one edge per ordered (from, to) pair: higher type precedence wins,
/// then higher confidence, then the earlier edge. Pairs keep the position of
/// their first occurrence.
pub fn dedupe_edges(edges: Vec<GraphEdge>) -> Vec<GraphEdge> {
    let mut slot: HashMap<(String, String), usize> = HashMap::new();
    let mut out: Vec<GraphEdge> = Vec::with_capacity(edges.len());

    for edge in edges {
        let key = (edge.from.clone(), edge.to.clone());
        match slot.get(&key) {
            Some(&idx) => {
                if outranks(&edge, &out[idx]) {
                    out[idx] = edge;
                }
            }
            None => {
                slot.insert(key, out.len());
                out.push(edge);
            }
        }
    }
    out
}

fn outranks(candidate: &GraphEdge, current: &GraphEdge) -> bool {
    let (cp, ep) = (
        candidate.edge_type.precedence(),
        current.edge_type.precedence(),
    );
    cp > ep || (cp == ep && candidate.confidence > current.confidence)
}

fn node_for(source: &Source) -> GraphNode {
    let title = if !source.title.trim().is_empty() {
        source.title.clone()
    } else {
        source.location.clone()
    };
    GraphNode {
        id: source.id.clone(),
        era: Era::from(source.category),
        title,
        label: short_label(source),
    }
}

fn short_label(source: &Source) -> String {
    let location = source.location.trim();
    if !location.is_empty() {
        return ellipsize(location, LABEL_MAX_CHARS);
    }
    let title = source.title.trim();
    if title.is_empty() {
        "Source".to_string()
    } else {
        ellipsize(title, LABEL_MAX_CHARS)
    }
}

fn source_tokens(source: &Source) -> HashSet<String> {
    [&source.title, &source.location, &source.text]
        .into_iter()
        .flat_map(|field| tokenize(field))
        .collect()
}

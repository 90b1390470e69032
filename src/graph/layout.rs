use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::graph::{Era, GraphEdge, GraphNode, ERA_ORDER};

const PADDING: f64 = 24.0;
const MIN_LANE_HEIGHT: f64 = 80.0;
const MIN_STEP: f64 = 100.0;
const NODE_RADIUS: f64 = 16.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 360.0,
            height: 480.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionedNode {
    #[serde(flatten)]
    pub node: GraphNode,
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

/// Quadratic curve from (x1, y1) to (x2, y2) with control point (cx, cy).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CurvePath {
    pub x1: f64,
    pub y1: f64,
    pub cx: f64,
    pub cy: f64,
    pub x2: f64,
    pub y2: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionedEdge {
    #[serde(flatten)]
    pub edge: GraphEdge,
    pub path: CurvePath,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutResult {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<PositionedEdge>,
    pub bounds: Bounds,
}

/// Place nodes in one horizontal lane per era and route every edge as a
/// quadratic curve between its endpoints.
///
/// Nodes are emitted lane by lane in era order. Edges whose endpoints are
/// not in `nodes` are dropped.
pub fn layout_graph(nodes: &[GraphNode], edges: &[GraphEdge], viewport: Viewport) -> LayoutResult {
    let lane_h = MIN_LANE_HEIGHT.max(viewport.height / ERA_ORDER.len() as f64);
    let lane_y = |era: Era| era.index() as f64 * lane_h + lane_h / 2.0;

    let mut positioned = Vec::with_capacity(nodes.len());
    for era in ERA_ORDER {
        let lane: Vec<&GraphNode> = nodes.iter().filter(|n| n.era == era).collect();
        let step = MIN_STEP.max((viewport.width - PADDING * 2.0) / lane.len().max(1) as f64);
        for (idx, node) in lane.into_iter().enumerate() {
            positioned.push(PositionedNode {
                node: node.clone(),
                x: PADDING + idx as f64 * step,
                y: lane_y(era),
                r: NODE_RADIUS,
            });
        }
    }

    let by_id: HashMap<&str, &PositionedNode> =
        positioned.iter().map(|n| (n.node.id.as_str(), n)).collect();

    let routed: Vec<PositionedEdge> = edges
        .iter()
        .filter_map(|e| {
            let a = by_id.get(e.from.as_str())?;
            let b = by_id.get(e.to.as_str())?;
            Some(PositionedEdge {
                edge: e.clone(),
                path: CurvePath {
                    x1: a.x,
                    y1: a.y,
                    cx: (a.x + b.x) / 2.0,
                    cy: (a.y + b.y) / 2.0,
                    x2: b.x,
                    y2: b.y,
                },
            })
        })
        .collect();

    let bounds = compute_bounds(&positioned, viewport);

    LayoutResult {
        nodes: positioned,
        edges: routed,
        bounds,
    }
}

fn compute_bounds(nodes: &[PositionedNode], viewport: Viewport) -> Bounds {
    let min_x = nodes.iter().map(|n| n.x).fold(0.0, f64::min) - PADDING;
    let max_x = nodes.iter().map(|n| n.x).fold(viewport.width, f64::max) + PADDING;
    let min_y = nodes.iter().map(|n| n.y).fold(0.0, f64::min) - PADDING;
    let max_y = nodes.iter().map(|n| n.y).fold(viewport.height, f64::max) + PADDING;
    Bounds {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    }
}

//! Sugya relationship graph: era lanes, typed edges and a toolkit-free layout.

pub mod build;
pub mod layout;

use serde::{Deserialize, Serialize};

use crate::models::Category;

pub use build::{build_sugya_graph, build_sugya_graph_with, dedupe_edges};
pub use layout::{layout_graph, Bounds, CurvePath, LayoutResult, PositionedEdge, PositionedNode, Viewport};

/// Lane a source is drawn in. Declaration order is lane order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Era {
    Gemara,
    Mishnah,
    Halacha,
    Torah,
    Other,
}

pub const ERA_ORDER: [Era; 5] = [Era::Gemara, Era::Mishnah, Era::Halacha, Era::Torah, Era::Other];

impl Era {
    pub fn index(self) -> usize {
        match self {
            Era::Gemara => 0,
            Era::Mishnah => 1,
            Era::Halacha => 2,
            Era::Torah => 3,
            Era::Other => 4,
        }
    }
}

impl From<Category> for Era {
    fn from(category: Category) -> Self {
        match category {
            Category::Gemara => Era::Gemara,
            Category::Mishnah => Era::Mishnah,
            Category::Halacha => Era::Halacha,
            Category::Torah => Era::Torah,
            Category::Other => Era::Other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub era: Era,
    pub title: String,
    /// Short display string
    pub label: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    Support,
    Argue,
    Quote,
}

impl EdgeType {
    /// Rank used when two edges compete for the same pair.
    pub fn precedence(self) -> u8 {
        match self {
            EdgeType::Argue => 3,
            EdgeType::Support => 2,
            EdgeType::Quote => 1,
        }
    }

    /// Parse a model-supplied type, treating anything unrecognised as a quote.
    pub fn from_label(label: &str) -> Self {
        match label {
            "argue" => EdgeType::Argue,
            "support" => EdgeType::Support,
            _ => EdgeType::Quote,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    /// 0..=1
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SugyaGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

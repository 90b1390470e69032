use chrono::Utc;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

use crate::graph::{LayoutResult, SugyaGraph, Viewport};
use crate::llm::chabura::{ChaburaOutline, ChaburaTemplate};

/// Classification of a retrieved source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Torah,
    Gemara,
    Mishnah,
    Halacha,
    /// Any label outside the four known eras
    #[serde(other)]
    Other,
}

impl Category {
    /// Map a free-form category label (as returned by the model) onto a category.
    pub fn from_label(label: &str) -> Self {
        let v = label.to_lowercase();
        if v.contains("gemara") || v.contains("talmud") {
            Category::Gemara
        } else if v.contains("mishnah") {
            Category::Mishnah
        } else if v.contains("torah") || v.contains("chumash") {
            Category::Torah
        } else if ["halacha", "halakh", "shulchan", "rambam", "poskim"]
            .iter()
            .any(|k| v.contains(k))
        {
            Category::Halacha
        } else {
            Category::Other
        }
    }
}

/// Language a single source is written in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    Hebrew,
    English,
}

/// Language preference for a search.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Hebrew,
    English,
    #[default]
    Both,
}

impl Language {
    /// Language assigned to sources whose own language field is missing.
    pub fn source_default(self) -> SourceLanguage {
        match self {
            Language::Hebrew => SourceLanguage::Hebrew,
            Language::English | Language::Both => SourceLanguage::English,
        }
    }
}

/// A retrieved Torah source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub text: String,
    pub category: Category,
    pub language: SourceLanguage,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: i64,
}

/// One executed search, kept in the history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRecord {
    pub id: String,
    pub query: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub language: Language,
}

/// A user-created folder for organising favorites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Folder {
    pub id: String,
    pub name: String,
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Search request
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Falls back to the stored preference when absent
    pub number_of_sources: Option<usize>,
    pub language: Option<Language>,
}

/// Search response
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub record: QueryRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionQuery {
    #[serde(default = "default_suggestion_max")]
    pub max: usize,
    /// Ask the LLM to re-rank the heuristic shortlist
    #[serde(default)]
    pub refine: bool,
}

fn default_suggestion_max() -> usize {
    4
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionResponse {
    pub suggestions: Vec<String>,
}

/// Graph request: the sources to map and the drawing area.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphRequest {
    pub sources: Vec<Source>,
    #[serde(default)]
    pub viewport: Viewport,
    /// Refine the heuristic edges with one LLM call
    #[serde(default)]
    pub enhance: bool,
    #[serde(default = "default_max_targets")]
    pub max_targets: usize,
}

fn default_max_targets() -> usize {
    20
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphResponse {
    pub graph: SugyaGraph,
    pub layout: LayoutResult,
    /// True when the edges came from the LLM rather than the heuristics
    pub enhanced: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FolderRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignRequest {
    pub folder_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FoldersResponse {
    pub folders: Vec<Folder>,
    /// source id -> folder id
    pub assignments: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChaburaRequest {
    /// May be empty for the daf template
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub template: ChaburaTemplate,
    #[serde(default = "default_ui_language")]
    pub ui_language: SourceLanguage,
    pub total_sources: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChaburaResponse {
    /// Topic actually sent, after template resolution
    pub topic: String,
    pub outline: ChaburaOutline,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionsRequest {
    pub topic: String,
    #[serde(default = "default_ui_language")]
    pub ui_language: SourceLanguage,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<String>,
}

fn default_ui_language() -> SourceLanguage {
    SourceLanguage::English
}

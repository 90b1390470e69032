//! # mafteiach
//!
//! A Torah-source study service: retrieves citations for a question through
//! an LLM, keeps the user's history and favorites, suggests related topics
//! from that history, compiles chabura outlines, and maps the retrieved
//! sources into a relationship graph with a deterministic layout.
//!
//! ## Architecture
//!
//! Suggestions and graphs are computed locally; the LLM only refines them,
//! and any failure falls back to the local result:
//!
//! ```text
//!      ┌──────────────┐                      ┌──────────────┐
//!      │   History    │                      │   Sources    │
//!      └──────┬───────┘                      └──────┬───────┘
//!             │ last 50                             │
//!             ▼                                     ▼
//!  ┌─────────────────────┐              ┌─────────────────────┐
//!  │ Candidate pool      │              │ Era lanes           │
//!  │ full + keyword      │              │ gemara → mishnah →  │
//!  │ phrases, scored by  │              │ halacha → torah →   │
//!  │ recency/freq/kw     │              │ other, chain edges  │
//!  └──────────┬──────────┘              └──────────┬──────────┘
//!             │ top 12                             │
//!             ▼                                    ▼
//!  ┌─────────────────────┐              ┌─────────────────────┐
//!  │ Theme filter        │              │ Token overlap ≥ 4   │
//!  │ Jaccard ≥ 0.25      │              │ support / argue     │
//!  │ (full always kept)  │              │ earlier → later era │
//!  └──────────┬──────────┘              └──────────┬──────────┘
//!             │                                    │ dedupe
//!             ▼                                    ▼
//!  ┌─────────────────────┐              ┌─────────────────────┐
//!  │ LLM re-rank         │              │ LLM edge refinement │
//!  │ optional, 2.5 s,    │              │ optional, 2.5 s,    │
//!  │ heuristic fallback  │              │ heuristic fallback  │
//!  └──────────┬──────────┘              └──────────┬──────────┘
//!             │                                    ▼
//!             │                         ┌─────────────────────┐
//!             │                         │ Lane layout         │
//!             │                         │ nodes, curves,      │
//!             │                         │ bounds              │
//!             ▼                         └──────────┬──────────┘
//!        suggestions                               ▼
//!                                                layout
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, data dir, LLM and thresholds
//! - [`models`] - Shared data types: `Source`, `QueryRecord`, `Folder`, request/response types
//! - [`text`] - Normalization, tokenization, keyword and negation lexicons
//! - [`suggest`] - History-based topic suggestions and recent topics
//! - [`graph::build`] - Sugya graph from era lanes and lexical overlap
//! - [`graph::layout`] - Deterministic lane layout with curved edges
//! - [`llm`] - Text-completion trait and the Ollama / OpenAI-compatible client
//! - [`llm::rerank`] - Optional re-ranking of topic suggestions
//! - [`llm::edges`] - Optional LLM refinement of graph edges
//! - [`llm::sources`] - Source retrieval with era distribution
//! - [`llm::chabura`] - Chabura outlines, templates and clarifying questions
//! - [`calendar`] - Daf Yomi lookup
//! - [`store`] - History, favorites, folders and preferences with JSON persistence
//! - [`api`] - Axum HTTP handlers
//! - [`state`] - Shared application state

pub mod api;
pub mod calendar;
pub mod config;
pub mod graph;
pub mod llm;
pub mod models;
pub mod state;
pub mod store;
pub mod suggest;
pub mod text;

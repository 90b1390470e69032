use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where history, favorites and preferences are stored
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Topic-suggestion thresholds
    pub suggest: SuggestParams,
    /// Relationship-graph thresholds
    pub graph: GraphParams,
    /// Timeout for the optional AI refinements (re-ranking, edge enhancement)
    pub ai_timeout_ms: u64,
    /// Calendar endpoint used for the Daf Yomi lookup
    pub calendar_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for completions
    pub chat_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
}

/// Tunables for the topic-suggestion engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestParams {
    /// Number of history records considered at all.
    pub history_window: usize,
    /// Maximum size of the scored candidate pool (never below 6).
    pub pool_size: usize,
    /// How many of the most recent queries make up the theme set.
    pub theme_window: usize,
    /// Minimum Jaccard similarity for phrase candidates.
    pub similarity_threshold: f64,
    /// History length required before the AI re-ranker is consulted.
    pub min_history_for_rerank: usize,
}

impl Default for SuggestParams {
    fn default() -> Self {
        Self {
            history_window: 50,
            pool_size: 12,
            theme_window: 5,
            similarity_threshold: 0.25,
            min_history_for_rerank: 10,
        }
    }
}

/// Tunables for the sugya relationship graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphParams {
    /// Shared tokens required before two sources are linked.
    pub min_shared_tokens: usize,
    /// Confidence of the sequential edges inside one era lane.
    pub chain_confidence: f64,
    /// Confidence of the overlap-derived edges.
    pub overlap_confidence: f64,
}

impl Default for GraphParams {
    fn default() -> Self {
        Self {
            min_shared_tokens: 4,
            chain_confidence: 0.4,
            overlap_confidence: 0.55,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9100".to_string(),
            llm: LlmConfig::default(),
            suggest: SuggestParams::default(),
            graph: GraphParams::default(),
            ai_timeout_ms: 2500,
            calendar_url: "https://www.sefaria.org/api/calendars".to_string(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-4o".to_string(),
            api_key: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("MAFTEIACH_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("MAFTEIACH_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("MAFTEIACH_AI_TIMEOUT_MS") {
            if let Ok(v) = val.parse() {
                config.ai_timeout_ms = v;
            }
        }
        if let Ok(val) = std::env::var("MAFTEIACH_SIMILARITY_THRESHOLD") {
            if let Ok(v) = val.parse::<f64>() {
                config.suggest.similarity_threshold = v.clamp(0.0, 1.0);
            }
        }
        if let Ok(val) = std::env::var("MAFTEIACH_MIN_SHARED_TOKENS") {
            if let Ok(v) = val.parse::<usize>() {
                config.graph.min_shared_tokens = v.max(1);
            }
        }
        if let Ok(url) = std::env::var("MAFTEIACH_CALENDAR_URL") {
            config.calendar_url = url;
        }

        config
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_millis(self.ai_timeout_ms)
    }

    pub fn library_path(&self) -> PathBuf {
        self.data_dir.join("library.json")
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join("preferences.json")
    }
}

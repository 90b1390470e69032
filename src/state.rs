use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use crate::config::Config;
use crate::llm::{LlmClient, TextCompletion};
use crate::store::{load_json, save_json, Library, Preferences};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub library: Arc<RwLock<Library>>,
    pub preferences: Arc<RwLock<Preferences>>,
    pub http_client: reqwest::Client,
    pub llm: Arc<dyn TextCompletion>,
    /// Held from snapshot to rename so saves land on disk in order
    persist_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        let llm = Arc::new(LlmClient::new(http_client.clone(), config.llm.clone()));
        Self::with_llm(config, http_client, llm)
    }

    /// Build state around a specific completion backend.
    pub fn with_llm(
        config: Config,
        http_client: reqwest::Client,
        llm: Arc<dyn TextCompletion>,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let library: Library = load_json(&config.library_path())?;
        let preferences = load_json::<Preferences>(&config.preferences_path())?.sanitized();
        tracing::info!(
            "Loaded {} history records and {} favorites",
            library.history.len(),
            library.favorites.len()
        );

        Ok(Self {
            config,
            library: Arc::new(RwLock::new(library)),
            preferences: Arc::new(RwLock::new(preferences)),
            http_client,
            llm,
            persist_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Persist history, favorites and folders to disk.
    pub fn persist_library(&self) {
        let _guard = self.persist_lock.lock();
        let library = self.library.read().clone();
        if let Err(e) = save_json(&self.config.library_path(), &library) {
            tracing::warn!("Failed to persist library: {e:#}");
        }
    }

    pub fn persist_preferences(&self) {
        let _guard = self.persist_lock.lock();
        let preferences = self.preferences.read().clone();
        if let Err(e) = save_json(&self.config.preferences_path(), &preferences) {
            tracing::warn!("Failed to persist preferences: {e:#}");
        }
    }
}

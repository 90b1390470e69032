//! User state: search history, favorites, folders and display preferences.
//!
//! Both containers are plain values; [`crate::state::AppState`] owns them
//! behind locks and persists them with [`save_json`].

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::{new_id, Folder, Language, QueryRecord, Source};

pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Library {
    /// Newest first
    #[serde(default)]
    pub history: Vec<QueryRecord>,
    /// Newest first, unique by id
    #[serde(default)]
    pub favorites: Vec<Source>,
    #[serde(default)]
    pub folders: Vec<Folder>,
    /// source id -> folder id
    #[serde(default)]
    pub source_folders: HashMap<String, String>,
}

impl Library {
    pub fn add_to_history(&mut self, record: QueryRecord) {
        self.history.insert(0, record);
        self.history.truncate(HISTORY_LIMIT);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Returns false if a favorite with the same id already exists.
    pub fn add_favorite(&mut self, source: Source) -> bool {
        if self.favorites.iter().any(|f| f.id == source.id) {
            return false;
        }
        self.favorites.insert(0, source);
        true
    }

    pub fn remove_favorite(&mut self, source_id: &str) -> bool {
        let before = self.favorites.len();
        self.favorites.retain(|f| f.id != source_id);
        self.source_folders.remove(source_id);
        self.favorites.len() != before
    }

    pub fn create_folder(&mut self, name: &str) -> Result<Folder> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Folder name is required");
        }
        let folder = Folder {
            id: new_id(),
            name: name.to_string(),
        };
        self.folders.push(folder.clone());
        Ok(folder)
    }

    pub fn assign_to_folder(&mut self, source_id: &str, folder_id: &str) -> Result<()> {
        if !self.folders.iter().any(|f| f.id == folder_id) {
            bail!("Folder {folder_id} not found");
        }
        self.source_folders
            .insert(source_id.to_string(), folder_id.to_string());
        Ok(())
    }

    pub fn remove_from_folder(&mut self, source_id: &str) -> bool {
        self.source_folders.remove(source_id).is_some()
    }

    pub fn folder_of(&self, source_id: &str) -> Option<&Folder> {
        let folder_id = self.source_folders.get(source_id)?;
        self.folders.iter().find(|f| &f.id == folder_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Preferences {
    pub language: Language,
    /// Multiple of 5 in 5..=50
    pub number_of_sources: usize,
    /// 0.8..=1.6
    pub text_scale: f64,
    /// 1.1..=1.8
    pub line_height: f64,
    pub justify_text: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: Language::Both,
            number_of_sources: 25,
            text_scale: 1.0,
            line_height: 1.35,
            justify_text: false,
        }
    }
}

impl Preferences {
    pub fn set_number_of_sources(&mut self, count: usize) {
        // Nearest multiple of five, halves rounding up
        self.number_of_sources = ((count.min(50) + 2) / 5 * 5).clamp(5, 50);
    }

    pub fn set_text_scale(&mut self, scale: f64) {
        self.text_scale = clamp_or(scale, 0.8, 1.6, 1.0);
    }

    pub fn set_line_height(&mut self, line_height: f64) {
        self.line_height = clamp_or(line_height, 1.1, 1.8, 1.35);
    }

    /// Re-apply every range rule, e.g. after deserializing user input.
    pub fn sanitized(mut self) -> Self {
        self.set_number_of_sources(self.number_of_sources);
        self.set_text_scale(self.text_scale);
        self.set_line_height(self.line_height);
        self
    }
}

fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

/// Load a JSON file, falling back to `T::default()` when it does not exist
/// or cannot be parsed.
pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match serde_json::from_str(&data) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!("Ignoring unreadable {}: {e}", path.display());
            Ok(T::default())
        }
    }
}

/// Write `value` as pretty JSON (atomic write via temp file + rename).
///
/// Concurrent saves to the same `path` must be serialized by the caller.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_string_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, data)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

//! Best-effort persistent cache mapping collection names to their
//! last-known host ids.
//!
//! The cache is non-authoritative: a stale id simply fails the by-id lookup
//! and resolution falls through to the scan/create strategies. Load and
//! save failures are swallowed at the call sites.

use crate::host::CollectionId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheData {
    collections: HashMap<String, String>,
}

/// File-backed collection-name -> id cache.
#[derive(Debug, Default)]
pub struct CollectionCache {
    entries: HashMap<String, String>,
    file_path: Option<PathBuf>,
    dirty: bool,
}

impl CollectionCache {
    /// In-memory only; nothing is persisted. Used when no cache directory
    /// is available and by tests that don't care about persistence.
    pub fn ephemeral() -> Self {
        Self::default()
    }

    pub fn with_path(path: PathBuf) -> Self {
        CollectionCache {
            entries: HashMap::new(),
            file_path: Some(path),
            dirty: false,
        }
    }

    /// Cache at the default per-user location, loading any existing
    /// entries. Falls back to an ephemeral cache when there is no cache
    /// directory or the file is unreadable.
    pub fn load_default() -> Self {
        let Some(path) = Self::default_path() else {
            debug!("no cache directory available, using ephemeral cache");
            return Self::ephemeral();
        };
        let mut cache = Self::with_path(path);
        if let Err(e) = cache.load() {
            debug!(error = %e, "collection cache unreadable, starting fresh");
            cache.entries.clear();
        }
        cache
    }

    fn default_path() -> Option<PathBuf> {
        dirs::cache_dir().map(|d| d.join("theme-sync").join("collections.json"))
    }

    #[instrument(name = "cache_load", skip(self))]
    pub fn load(&mut self) -> Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cache file: {}", path.display()))?;
        let data: CacheData =
            serde_json::from_str(&content).context("Failed to parse cache JSON")?;
        self.entries = data.collections;
        debug!(entry_count = self.entries.len(), "loaded collection cache");
        self.dirty = false;
        Ok(())
    }

    /// Atomic save (temp file + rename). No-op when nothing changed or the
    /// cache is ephemeral.
    #[instrument(name = "cache_save", skip(self))]
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let Some(path) = self.file_path.clone() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let json = serde_json::to_string(&CacheData {
            collections: self.entries.clone(),
        })
        .context("Failed to serialize cache")?;

        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, &json)
            .with_context(|| format!("Failed to write temp cache file: {}", temp_path.display()))?;
        std::fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to rename temp file to {}", path.display()))?;

        info!(entry_count = self.entries.len(), "saved collection cache");
        self.dirty = false;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<CollectionId> {
        self.entries.get(name).cloned().map(CollectionId)
    }

    pub fn insert(&mut self, name: &str, id: &CollectionId) {
        let previous = self.entries.insert(name.to_string(), id.0.clone());
        if previous.as_deref() != Some(id.0.as_str()) {
            self.dirty = true;
        }
    }
}

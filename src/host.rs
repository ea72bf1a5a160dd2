//! Host variable-store integration surface.
//!
//! The host owns collections of color variables with per-mode values. All
//! calls are async and the engine awaits them strictly sequentially, so a
//! store implementation never sees concurrent mutation from a single run.
//! Optional lookups are advertised once through [`Capabilities`] instead of
//! probed per call; a missing capability degrades to the next resolution
//! strategy, never to a hard failure.
//!
//! [`InMemoryStore`] is the reference implementation: it backs the CLI
//! (persisted to a JSON file between runs) and the test suite.

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModeId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableId(pub String);

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A mode slot within a collection as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeHandle {
    pub id: ModeId,
    pub name: String,
    /// Hosts that track a canonical slug report it here; otherwise the
    /// slug is derived from `name`.
    pub slug: Option<String>,
}

/// Optional lookup capabilities, checked once at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub lookup_by_name: bool,
    pub lookup_by_id: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities {
            lookup_by_name: true,
            lookup_by_id: true,
        }
    }
}

/// The capability set the sync engine requires from a host.
///
/// Every method is attempted exactly once per call site; there is no retry
/// policy anywhere in the engine.
#[async_trait]
pub trait VariableStore: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    async fn list_collections(&self) -> Result<Vec<CollectionId>>;
    /// Exact-name lookup; only called when `capabilities().lookup_by_name`.
    async fn collection_by_name(&self, name: &str) -> Result<Option<CollectionId>>;
    /// Id lookup; only called when `capabilities().lookup_by_id`.
    async fn collection_by_id(&self, id: &CollectionId) -> Result<Option<CollectionId>>;
    async fn collection_name(&self, id: &CollectionId) -> Result<String>;
    async fn create_collection(&self, name: &str) -> Result<CollectionId>;

    async fn list_modes(&self, collection: &CollectionId) -> Result<Vec<ModeHandle>>;
    async fn create_mode(&self, collection: &CollectionId, slug: &str) -> Result<ModeHandle>;

    async fn variable_by_name(
        &self,
        collection: &CollectionId,
        name: &str,
    ) -> Result<Option<VariableId>>;
    async fn create_color_variable(
        &self,
        collection: &CollectionId,
        name: &str,
        initial_value: &str,
    ) -> Result<VariableId>;

    /// Current value of a variable for a mode, as a plain hex string.
    /// `None` means the variable has no value set for that mode; a mode id
    /// the store does not know also reads as unset.
    async fn get_value(&self, variable: &VariableId, mode: &ModeId) -> Result<Option<String>>;
    async fn set_value(&self, variable: &VariableId, mode: &ModeId, value: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// In-memory reference store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VariableRecord {
    id: VariableId,
    name: String,
    /// mode id -> hex value
    values: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModeRecord {
    id: ModeId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CollectionRecord {
    id: CollectionId,
    name: String,
    #[serde(default)]
    modes: Vec<ModeRecord>,
    #[serde(default)]
    variables: Vec<VariableRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    collections: Vec<CollectionRecord>,
}

/// JSON-file-backed variable store used by the CLI and tests.
pub struct InMemoryStore {
    data: Mutex<StoreData>,
    capabilities: Capabilities,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            data: Mutex::new(StoreData::default()),
            capabilities: Capabilities::default(),
        }
    }

    /// Restrict advertised capabilities (exercises the fallback strategies).
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        InMemoryStore {
            data: Mutex::new(StoreData::default()),
            capabilities,
        }
    }

    /// Load a store from a JSON file. A missing file yields an empty store.
    #[instrument(name = "store_load", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("store file not found, starting empty");
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        let data: StoreData = serde_json::from_str(&content)?;
        debug!(collections = data.collections.len(), "loaded store");
        Ok(InMemoryStore {
            data: Mutex::new(data),
            capabilities: Capabilities::default(),
        })
    }

    /// Save the store atomically (write temp file, then rename).
    #[instrument(name = "store_save", skip_all, fields(path = %path.display()))]
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&*self.data.lock())?;
        let temp_path: PathBuf = path.with_extension("json.tmp");
        std::fs::write(&temp_path, &json)?;
        std::fs::rename(&temp_path, path)?;
        info!(bytes = json.len(), "saved store");
        Ok(())
    }

    fn next_id(prefix: &str) -> String {
        format!("{prefix}-{}", uuid::Uuid::new_v4())
    }

    fn host_err(what: &str) -> SyncError {
        SyncError::Host(what.to_string())
    }
}

#[async_trait]
impl VariableStore for InMemoryStore {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn list_collections(&self) -> Result<Vec<CollectionId>> {
        Ok(self
            .data
            .lock()
            .collections
            .iter()
            .map(|c| c.id.clone())
            .collect())
    }

    async fn collection_by_name(&self, name: &str) -> Result<Option<CollectionId>> {
        Ok(self
            .data
            .lock()
            .collections
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id.clone()))
    }

    async fn collection_by_id(&self, id: &CollectionId) -> Result<Option<CollectionId>> {
        Ok(self
            .data
            .lock()
            .collections
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.id.clone()))
    }

    async fn collection_name(&self, id: &CollectionId) -> Result<String> {
        self.data
            .lock()
            .collections
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.name.clone())
            .ok_or_else(|| Self::host_err("unknown collection id"))
    }

    async fn create_collection(&self, name: &str) -> Result<CollectionId> {
        let id = CollectionId(Self::next_id("col"));
        self.data.lock().collections.push(CollectionRecord {
            id: id.clone(),
            name: name.to_string(),
            modes: Vec::new(),
            variables: Vec::new(),
        });
        debug!(%id, name, "created collection");
        Ok(id)
    }

    async fn list_modes(&self, collection: &CollectionId) -> Result<Vec<ModeHandle>> {
        let data = self.data.lock();
        let col = data
            .collections
            .iter()
            .find(|c| &c.id == collection)
            .ok_or_else(|| Self::host_err("unknown collection id"))?;
        Ok(col
            .modes
            .iter()
            .map(|m| ModeHandle {
                id: m.id.clone(),
                name: m.name.clone(),
                slug: m.slug.clone(),
            })
            .collect())
    }

    async fn create_mode(&self, collection: &CollectionId, slug: &str) -> Result<ModeHandle> {
        let mut data = self.data.lock();
        let col = data
            .collections
            .iter_mut()
            .find(|c| &c.id == collection)
            .ok_or_else(|| Self::host_err("unknown collection id"))?;
        let record = ModeRecord {
            id: ModeId(Self::next_id("mode")),
            name: slug.to_string(),
            slug: Some(slug.to_string()),
        };
        col.modes.push(record.clone());
        Ok(ModeHandle {
            id: record.id,
            name: record.name,
            slug: record.slug,
        })
    }

    async fn variable_by_name(
        &self,
        collection: &CollectionId,
        name: &str,
    ) -> Result<Option<VariableId>> {
        let data = self.data.lock();
        let col = data
            .collections
            .iter()
            .find(|c| &c.id == collection)
            .ok_or_else(|| Self::host_err("unknown collection id"))?;
        Ok(col
            .variables
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.id.clone()))
    }

    async fn create_color_variable(
        &self,
        collection: &CollectionId,
        name: &str,
        initial_value: &str,
    ) -> Result<VariableId> {
        let mut data = self.data.lock();
        let col = data
            .collections
            .iter_mut()
            .find(|c| &c.id == collection)
            .ok_or_else(|| Self::host_err("unknown collection id"))?;
        let id = VariableId(Self::next_id("var"));
        let mut values = BTreeMap::new();
        // The seed value applies to every existing mode, matching hosts
        // that require an initial value at variable creation
        for mode in &col.modes {
            values.insert(mode.id.0.clone(), initial_value.to_string());
        }
        col.variables.push(VariableRecord {
            id: id.clone(),
            name: name.to_string(),
            values,
        });
        Ok(id)
    }

    async fn get_value(&self, variable: &VariableId, mode: &ModeId) -> Result<Option<String>> {
        let data = self.data.lock();
        for col in &data.collections {
            if let Some(var) = col.variables.iter().find(|v| &v.id == variable) {
                return Ok(var.values.get(&mode.0).cloned());
            }
        }
        Err(Self::host_err("unknown variable id"))
    }

    async fn set_value(&self, variable: &VariableId, mode: &ModeId, value: &str) -> Result<()> {
        let mut data = self.data.lock();
        for col in &mut data.collections {
            if let Some(var) = col.variables.iter_mut().find(|v| &v.id == variable) {
                var.values.insert(mode.0.clone(), value.to_string());
                return Ok(());
            }
        }
        Err(Self::host_err("unknown variable id"))
    }
}

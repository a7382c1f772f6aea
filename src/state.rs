//! Persisted state collaborator
//!
//! Only the Load/Save contract matters to the engine; the byte-level
//! format is an implementation detail of the backend. A load failure is
//! recoverable: the orchestrator substitutes an empty
//! previous state and logs a warning rather than aborting the run.

use crate::resource::Resource;
use crate::types::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

/// The stored form of a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedResource {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl PersistedResource {
    /// Snapshot a live resource for persistence
    pub fn from_resource(resource: &Resource) -> Self {
        let meta = resource.meta();
        Self {
            id: resource.id(),
            type_name: meta.kind.type_label().to_string(),
            name: meta.name.clone(),
            module: meta.module.clone(),
            status: meta.status,
            depends_on: meta.depends_on.clone(),
            links: meta.links.clone(),
            fields: resource.fields.clone(),
        }
    }

    /// Serialized bytes handed to providers
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// State collaborator: previous resource set in, new resource set out
pub trait State: Send + Sync {
    /// Load the previously persisted resource set
    ///
    /// `Ok(None)` means no previous state exists, which is not an
    /// error.
    fn load(&self) -> anyhow::Result<Option<Vec<PersistedResource>>>;

    /// Persist the resource set, replacing any previous one
    fn save(&self, resources: &[PersistedResource]) -> anyhow::Result<()>;
}

/// On-disk state document
#[derive(Debug, Serialize, Deserialize)]
struct StateDocument {
    resources: Vec<PersistedResource>,
    last_updated: DateTime<Utc>,
}

/// JSON-file-backed state
#[derive(Debug, Clone)]
pub struct FileState {
    path: PathBuf,
}

impl FileState {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl State for FileState {
    fn load(&self) -> anyhow::Result<Option<Vec<PersistedResource>>> {
        if !self.path.exists() {
            log::debug!("state file {} does not exist", self.path.display());
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let doc: StateDocument = serde_json::from_str(&content)?;
        log::debug!(
            "loaded {} resources from {}",
            doc.resources.len(),
            self.path.display()
        );
        Ok(Some(doc.resources))
    }

    fn save(&self, resources: &[PersistedResource]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let doc = StateDocument {
            resources: resources.to_vec(),
            last_updated: Utc::now(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&doc)?)?;
        log::debug!(
            "saved {} resources to {}",
            resources.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// In-memory state for tests and embedders
#[derive(Debug, Default)]
pub struct MemoryState {
    resources: std::sync::Mutex<Option<Vec<PersistedResource>>>,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the previous resource set
    pub fn with_resources(resources: Vec<PersistedResource>) -> Self {
        Self {
            resources: std::sync::Mutex::new(Some(resources)),
        }
    }

    /// The last saved resource set, if any
    pub fn snapshot(&self) -> Option<Vec<PersistedResource>> {
        self.resources
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl State for MemoryState {
    fn load(&self) -> anyhow::Result<Option<Vec<PersistedResource>>> {
        Ok(self.snapshot())
    }

    fn save(&self, resources: &[PersistedResource]) -> anyhow::Result<()> {
        *self
            .resources
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(resources.to_vec());
        Ok(())
    }
}

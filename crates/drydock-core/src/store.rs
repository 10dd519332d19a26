//! Project configuration store.
//!
//! Configurations persist as one flat JSON object keyed by project
//! name. Every write rewrites the whole file — no partial update, no
//! versioning; last writer wins. An in-memory fake satisfies the same
//! contract for tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{DrydockError, ProjectConfig, Result};

/// Read/write access to the named project configurations.
///
/// Guarantees:
/// - `get` observes the latest completed `upsert` for that name.
/// - `upsert` replaces the named configuration wholesale.
/// - A missing backing file reads as an empty mapping, not an error.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// All configurations, keyed by project name.
    async fn load(&self) -> Result<HashMap<String, ProjectConfig>>;

    /// One configuration by name, if present.
    async fn get(&self, name: &str) -> Result<Option<ProjectConfig>>;

    /// Create or overwrite the named configuration.
    async fn upsert(&self, name: &str, config: ProjectConfig) -> Result<()>;
}

/// JSON-file-backed store.
pub struct JsonProjectStore {
    path: PathBuf,
}

impl JsonProjectStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProjectStore for JsonProjectStore {
    async fn load(&self) -> Result<HashMap<String, ProjectConfig>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(DrydockError::Io(e)),
        }
    }

    async fn get(&self, name: &str) -> Result<Option<ProjectConfig>> {
        Ok(self.load().await?.remove(name))
    }

    async fn upsert(&self, name: &str, config: ProjectConfig) -> Result<()> {
        let mut projects = self.load().await?;
        projects.insert(name.to_string(), config);
        let text = serde_json::to_string_pretty(&projects)?;
        tokio::fs::write(&self.path, text).await?;
        Ok(())
    }
}

/// In-memory store backed by a `Mutex<HashMap>` (testing only).
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    projects: Mutex<HashMap<String, ProjectConfig>>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn load(&self) -> Result<HashMap<String, ProjectConfig>> {
        Ok(self.projects.lock().unwrap().clone())
    }

    async fn get(&self, name: &str) -> Result<Option<ProjectConfig>> {
        Ok(self.projects.lock().unwrap().get(name).cloned())
    }

    async fn upsert(&self, name: &str, config: ProjectConfig) -> Result<()> {
        self.projects
            .lock()
            .unwrap()
            .insert(name.to_string(), config);
        Ok(())
    }
}

//! Packaged-artifact store for mobile builds.
//!
//! Artifacts are plain files in a fixed directory, named
//! `{project}_{build_id}.apk`. Unique per (project, build identifier),
//! so writes never collide. Deleted only on explicit request.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{BuildId, DrydockError, Result};

/// A stored package file.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactInfo {
    pub name: String,
    pub size_bytes: u64,
    pub created: DateTime<Utc>,
}

/// Directory-backed artifact store.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The store's directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The canonical file name for one build's package.
    pub fn artifact_name(project: &str, build_id: &BuildId, extension: &str) -> String {
        format!("{}_{}.{}", project, build_id, extension)
    }

    /// Copy a produced package into the store under its canonical name.
    pub fn save(&self, project: &str, build_id: &BuildId, source: &Path) -> Result<PathBuf> {
        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("apk");
        let dest = self.dir.join(Self::artifact_name(project, build_id, extension));
        fs::copy(source, &dest)?;
        Ok(dest)
    }

    /// Enumerate stored packages with size and creation time.
    pub fn list(&self) -> Result<Vec<ArtifactInfo>> {
        let mut artifacts = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            artifacts.push(ArtifactInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                size_bytes: metadata.len(),
                created,
            });
        }
        artifacts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(artifacts)
    }

    /// Resolve a stored package by file name, checking existence.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(DrydockError::ArtifactNotFound(name.to_string()));
        }
        Ok(path)
    }

    /// Delete a stored package. Not-found is an error, not a no-op.
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.resolve(name)?;
        fs::remove_file(path)?;
        Ok(())
    }
}

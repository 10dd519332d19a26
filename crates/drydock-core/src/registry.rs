//! Concurrently-accessed build status registry.
//!
//! The single source of truth polled by clients. One record per build
//! identifier, latest-write-wins, no history, never persisted —
//! created once at process start and shared as an `Arc` with every
//! pipeline task.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::{BuildId, BuildRecord};

/// Mutex-guarded map from build identifier to its latest record.
///
/// Concurrent writers are always distinct build identifiers: a record
/// is written only by the pipeline task that owns the identifier, or —
/// during an `auth_required` pause — by the credential-resume handler,
/// which is the only writer at that point. Identifiers are never
/// reused.
#[derive(Debug, Default)]
pub struct StatusRegistry {
    builds: Mutex<HashMap<String, BuildRecord>>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or unconditionally overwrite the record for `id`.
    pub fn register(&self, id: &BuildId, record: BuildRecord) {
        let mut builds = self.builds.lock().unwrap();
        builds.insert(id.0.clone(), record);
    }

    /// Same as [`register`](Self::register); used for each transition.
    pub fn update(&self, id: &BuildId, record: BuildRecord) {
        self.register(id, record);
    }

    /// Latest record for `id`, or the `unknown` sentinel if absent.
    pub fn get(&self, id: &BuildId) -> BuildRecord {
        let builds = self.builds.lock().unwrap();
        builds.get(&id.0).cloned().unwrap_or_else(BuildRecord::unknown)
    }
}

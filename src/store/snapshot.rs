//! # Durable Snapshots
//!
//! The whole coordinator state serializes to a single JSON document that is
//! rewritten after mutating operations. Writes go through a temp file and an
//! atomic rename so a crash mid-write never leaves a torn snapshot; a failed
//! write is logged and the in-memory state stays authoritative.

use crate::constants::events;
use crate::error::{Result, ScoutError};
use crate::models::Unit;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Everything that survives a restart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinatorSnapshot {
    pub units: Vec<Unit>,
    pub next_sequence: u64,
    pub total_results: u64,
    pub tier_counts: BTreeMap<String, u64>,
    /// Message ref retained by the periodic status reporter, for in-place
    /// edits across restarts.
    pub status_message_ref: Option<String>,
}

/// Abstract durable store for coordinator snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// `Ok(None)` means a clean start (nothing persisted yet).
    async fn load(&self) -> Result<Option<CoordinatorSnapshot>>;
    async fn persist(&self, snapshot: &CoordinatorSnapshot) -> Result<()>;
}

/// File-backed snapshot store using temp-file-and-rename.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self) -> Result<Option<CoordinatorSnapshot>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ScoutError::PersistenceError(format!(
                    "read {}: {e}",
                    self.path.display()
                )))
            }
        };
        let snapshot = serde_json::from_slice(&raw).map_err(|e| {
            ScoutError::PersistenceError(format!("decode {}: {e}", self.path.display()))
        })?;
        Ok(Some(snapshot))
    }

    async fn persist(&self, snapshot: &CoordinatorSnapshot) -> Result<()> {
        let encoded = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| ScoutError::PersistenceError(format!("encode snapshot: {e}")))?;

        let temp = self.temp_path();
        tokio::fs::write(&temp, &encoded).await.map_err(|e| {
            ScoutError::PersistenceError(format!("write {}: {e}", temp.display()))
        })?;
        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            ScoutError::PersistenceError(format!("rename {}: {e}", self.path.display()))
        })?;

        debug!(
            event = events::SNAPSHOT_PERSISTED,
            path = %self.path.display(),
            units = snapshot.units.len(),
            "Snapshot persisted"
        );
        Ok(())
    }
}

/// In-memory snapshot store for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    inner: parking_lot::Mutex<Option<CoordinatorSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> Result<Option<CoordinatorSnapshot>> {
        Ok(self.inner.lock().clone())
    }

    async fn persist(&self, snapshot: &CoordinatorSnapshot) -> Result<()> {
        *self.inner.lock() = Some(snapshot.clone());
        Ok(())
    }
}

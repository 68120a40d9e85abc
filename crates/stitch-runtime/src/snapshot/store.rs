//! # Snapshot Stores
//!
//! Where snapshots go between runs.
//!
//! - [`MemorySnapshotStore`] - in-process, for tests and embedding
//! - [`JsonFileStore`] - one JSON file, replaced atomically on save
//!
//! [`Persistence`] ties a store to a container. When to call `restore` and
//! `save` is up to the host.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::Snapshot;
use crate::container::Container;

/// Snapshot store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Snapshot I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable home for a [`Snapshot`].
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// The last saved snapshot, or `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Replace the stored snapshot.
    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    saved: RwLock<Option<Snapshot>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start out holding `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            saved: RwLock::new(Some(snapshot)),
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<Snapshot> {
        self.saved.read().clone()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.current())
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.saved.write() = Some(snapshot.clone());
        Ok(())
    }
}

/// Store backed by a single JSON file.
///
/// Saves write a sibling `.tmp` file and rename it over the target, so a
/// crash mid-save leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No snapshot file");
                return Ok(None);
            }
            Err(e) => return Err(io_error(&self.path, e)),
        };

        Ok(Some(Snapshot::from_json(&json)?))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| io_error(dir, e))?;
        }

        let json = snapshot.to_json()?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json)
            .await
            .map_err(|e| io_error(&temp, e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| io_error(&self.path, e))?;

        debug!(path = %self.path.display(), services = snapshot.len(), "Snapshot written");
        Ok(())
    }
}

/// A container paired with the store its snapshots live in.
pub struct Persistence<S> {
    container: Container,
    store: S,
}

impl<S: SnapshotStore> Persistence<S> {
    pub fn new(container: Container, store: S) -> Self {
        Self { container, store }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the stored snapshot and restore it into the container.
    ///
    /// Unreadable or corrupt data leaves every field at its default and is
    /// only logged. Returns the number of fields restored.
    pub async fn restore(&self) -> usize {
        match self.store.load().await {
            Ok(Some(snapshot)) => self.container.restore(&snapshot),
            Ok(None) => {
                info!("No saved snapshot, starting from defaults");
                0
            }
            Err(e) => {
                warn!(error = %e, "Saved snapshot unusable, starting from defaults");
                0
            }
        }
    }

    /// Capture the container and replace the stored snapshot.
    pub async fn save(&self) -> Result<(), StoreError> {
        let snapshot = self.container.snapshot();
        self.store.save(&snapshot).await?;
        info!(services = snapshot.len(), "Snapshot saved");
        Ok(())
    }
}

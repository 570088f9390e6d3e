//! Durable naming state.
//!
//! Storage layout:
//! ```text
//! <data_dir>/containers/
//! └── names.json      # container records and link edges
//! ```
//!
//! Name indices are not stored; they are rebuilt from the records on load.

use crate::{
    error::{ContainerError, Result},
    links::LinkEdge,
    state::Container,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// File name of the state file inside the containers directory.
pub const STATE_FILE: &str = "names.json";

/// Point-in-time copy of the naming state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Live containers.
    pub containers: Vec<Container>,
    /// Link edges.
    pub links: Vec<LinkEdge>,
}

/// Backend that persists snapshots.
pub trait StateStore: Send + Sync {
    /// Loads the last saved snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if stored state exists but cannot be read.
    fn load(&self) -> Result<Option<Snapshot>>;

    /// Replaces the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Snapshot stored as a JSON file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store writing to `dir/names.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            path: dir.as_ref().join(STATE_FILE),
        })
    }

    /// Returns the path of the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let data = fs::read(&self.path)?;
        let snapshot: Snapshot = serde_json::from_slice(&data)?;
        debug!(
            path = %self.path.display(),
            containers = snapshot.containers.len(),
            links = snapshot.links.len(),
            "loaded naming state"
        );
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let data = serde_json::to_vec_pretty(snapshot)?;
        let temp_path = self.path.with_extension("tmp");

        fs::write(&temp_path, &data)?;
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!(path = %self.path.display(), "saved naming state");
        Ok(())
    }
}

/// Snapshot kept in memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<Snapshot>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        self.snapshot
            .lock()
            .map(|snapshot| snapshot.clone())
            .map_err(|_| ContainerError::Store("lock poisoned".to_string()))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let mut stored = self
            .snapshot
            .lock()
            .map_err(|_| ContainerError::Store("lock poisoned".to_string()))?;
        *stored = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ContainerState;
    use tempfile::tempdir;

    fn sample() -> Snapshot {
        let db = Container::new("db1", "postgres");
        let mut app = Container::new("app1", "alpine");
        app.state = ContainerState::Running;
        let links = vec![LinkEdge {
            source: app.id.clone(),
            alias: "mysql".to_string(),
            target: db.id.clone(),
        }];
        Snapshot {
            containers: vec![db, app],
            links,
        }
    }

    #[test]
    fn test_json_store_missing_file() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("containers")).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_json_store_save_and_load() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        let snapshot = sample();

        store.save(&snapshot).unwrap();
        assert!(store.path().exists());
        assert!(!store.path().with_extension("tmp").exists());

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.links[0].alias, "mysql");
    }

    #[test]
    fn test_json_store_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        fs::write(store.path(), b"{not json").unwrap();

        assert!(matches!(store.load(), Err(ContainerError::Json(_))));
    }

    #[test]
    fn test_memory_store_overwrites() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        store.save(&sample()).unwrap();
        store.save(&Snapshot::default()).unwrap();
        assert_eq!(store.load().unwrap(), Some(Snapshot::default()));
    }
}

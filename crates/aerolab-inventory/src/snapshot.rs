//! On-disk inventory snapshot
//!
//! Persists an [`Inventory`] as a versioned JSON file. Writing keeps the
//! previous file as `<name>.backup`. The same file backs the `file` inventory
//! provider.

use crate::error::{InventoryError, Result};
use crate::model::{Instance, Volume};
use crate::provider::{Inventory, InventoryProvider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const SNAPSHOT_VERSION: u32 = 1;
const BACKUP_SUFFIX: &str = "backup";

/// File format of a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Snapshot file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub instances: Vec<Instance>,

    #[serde(default)]
    pub volumes: Vec<Volume>,
}

impl From<&Inventory> for SnapshotFile {
    fn from(inventory: &Inventory) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            updated_at: inventory.taken_at,
            instances: inventory.instances.to_vec(),
            volumes: inventory.volumes.to_vec(),
        }
    }
}

/// Reads and writes snapshot files
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".");
        name.push(BACKUP_SUFFIX);
        PathBuf::from(name)
    }

    /// Load the snapshot, an empty inventory when the file does not exist
    pub async fn load(&self) -> Result<Inventory> {
        if !self.path.exists() {
            tracing::debug!("Snapshot {} not found, returning empty inventory", self.path.display());
            return Ok(Inventory::default());
        }

        let content = fs::read_to_string(&self.path).await?;
        let file: SnapshotFile = serde_json::from_str(&content)?;

        if file.version > SNAPSHOT_VERSION {
            return Err(InventoryError::Snapshot(format!(
                "Snapshot file version {} is newer than supported version {}",
                file.version, SNAPSHOT_VERSION
            )));
        }

        let mut inventory = Inventory::new(file.instances, file.volumes)?;
        inventory.taken_at = file.updated_at;

        tracing::debug!(
            "Loaded snapshot with {} instances and {} volumes",
            inventory.instances.len(),
            inventory.volumes.len()
        );
        Ok(inventory)
    }

    /// Save the snapshot, keeping the previous one as a backup
    pub async fn save(&self, inventory: &Inventory) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).await?;
                tracing::debug!("Created snapshot directory: {}", dir.display());
            }
        }

        let backup = self.backup_path();
        if self.path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&self.path, &backup).await?;
            tracing::debug!("Created snapshot backup");
        }

        let content = serde_json::to_string_pretty(&SnapshotFile::from(inventory))?;
        fs::write(&self.path, content).await?;

        tracing::debug!("Saved snapshot with {} instances", inventory.instances.len());
        Ok(())
    }
}

/// Inventory read from a snapshot file
pub struct FileInventory {
    store: SnapshotStore,
}

impl FileInventory {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            store: SnapshotStore::new(path),
        }
    }
}

#[async_trait]
impl InventoryProvider for FileInventory {
    fn name(&self) -> &str {
        "file"
    }

    async fn snapshot(&self) -> Result<Inventory> {
        if !self.store.path().exists() {
            return Err(InventoryError::Backend(format!(
                "inventory file {} does not exist",
                self.store.path().display()
            )));
        }
        self.store.load().await
    }
}

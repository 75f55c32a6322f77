#![allow(deprecated)]

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Inventory snapshot with three clusters:
/// `mydc` (3 running nodes), `cold` (3 stopped nodes) and `old` (terminated)
pub const LAB_INVENTORY: &str = r#"{
  "version": 1,
  "updated_at": "2026-01-01T00:00:00Z",
  "instances": [
    { "cluster_name": "mydc", "node_no": 1, "name": "mydc-1", "backend_type": "docker",
      "ip": { "private": "172.17.0.2" }, "owner": "alice",
      "creation_time": "2026-01-01T00:00:00Z", "state": "Running" },
    { "cluster_name": "mydc", "node_no": 2, "name": "mydc-2", "backend_type": "docker",
      "ip": { "private": "172.17.0.3" }, "owner": "alice",
      "creation_time": "2026-01-01T00:00:00Z", "state": "Running" },
    { "cluster_name": "mydc", "node_no": 3, "name": "mydc-3", "backend_type": "docker",
      "ip": { "private": "172.17.0.4" }, "owner": "alice",
      "creation_time": "2026-01-01T00:00:00Z", "state": "Running" },
    { "cluster_name": "cold", "node_no": 1, "name": "cold-1", "backend_type": "docker",
      "creation_time": "2026-01-01T00:00:00Z", "state": "Stopped" },
    { "cluster_name": "cold", "node_no": 2, "name": "cold-2", "backend_type": "docker",
      "creation_time": "2026-01-01T00:00:00Z", "state": "Stopped" },
    { "cluster_name": "cold", "node_no": 3, "name": "cold-3", "backend_type": "docker",
      "creation_time": "2026-01-01T00:00:00Z", "state": "Stopped" },
    { "cluster_name": "old", "node_no": 1, "name": "old-1", "backend_type": "aws",
      "ip": { "private": "10.0.0.9", "public": "54.0.0.9" },
      "creation_time": "2025-06-01T00:00:00Z", "state": "Terminated" }
  ],
  "volumes": [
    { "name": "mydc-data", "backend_type": "docker", "size": 0,
      "state": "InUse", "attached_to": ["mydc-1"],
      "creation_time": "2026-01-01T00:00:00Z" },
    { "name": "scratch-gone", "backend_type": "docker",
      "state": "Deleted", "creation_time": "2025-06-01T00:00:00Z" }
  ]
}"#;

/// Isolated config directory plus an inventory snapshot
pub struct TestLab {
    pub home: TempDir,
}

impl TestLab {
    pub fn new() -> Self {
        Self::with_inventory(LAB_INVENTORY)
    }

    pub fn with_inventory(content: &str) -> Self {
        let home = tempfile::tempdir().unwrap();
        fs::write(home.path().join("inventory.json"), content).unwrap();
        Self { home }
    }

    pub fn inventory_path(&self) -> PathBuf {
        self.home.path().join("inventory.json")
    }

    /// `aerolab --backend file --inventory <snapshot>` with a private config dir
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("aerolab").unwrap();
        cmd.env("AEROLAB_HOME", self.home.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("AEROLAB_BACKEND")
            .env_remove("AEROLAB_INVENTORY")
            .arg("--backend")
            .arg("file")
            .arg("--inventory")
            .arg(self.inventory_path());
        cmd
    }
}

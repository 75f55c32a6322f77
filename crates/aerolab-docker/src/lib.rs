//! AeroLab Docker backend
//!
//! Cluster nodes are containers labelled with `AEROLAB_CLUSTER_NAME` and
//! `AEROLAB_NODE_NO`. The inventory is read from those labels and remote
//! actions run through docker exec.

pub mod inventory;
pub mod remote;

pub use inventory::{DockerInventory, container_state};
pub use remote::DockerRemote;

use aerolab_inventory::{InventoryError, Result};
use bollard::Docker;

/// Connect to the local Docker daemon and check it answers
pub async fn connect() -> Result<Docker> {
    let docker = Docker::connect_with_local_defaults()
        .map_err(|e| InventoryError::Backend(format!("could not connect to Docker: {}", e)))?;
    docker.ping().await.map_err(|e| {
        InventoryError::Backend(format!(
            "Docker is not responding: {}\n\nHint:\n  • check that the Docker daemon is running\n  • check that `docker ps` works",
            e
        ))
    })?;
    tracing::debug!("Connected to Docker");
    Ok(docker)
}

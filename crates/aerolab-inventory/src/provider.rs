//! Inventory provider trait definition

use crate::error::{InventoryError, Result};
use crate::filter::{InstanceList, Instances, VolumeList, Volumes};
use crate::model::NodeId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Inventory population abstraction
///
/// Every backend (docker, a snapshot file, cloud APIs) implements this trait
/// to produce one immutable [`Inventory`] per command invocation.
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    /// Returns the backend name (e.g., "docker", "file")
    fn name(&self) -> &str;

    /// Read every instance and volume the backend currently reports
    async fn snapshot(&self) -> Result<Inventory>;
}

/// One materialized inventory snapshot
#[derive(Debug, Clone, Default, Serialize)]
pub struct Inventory {
    pub instances: InstanceList,
    pub volumes: VolumeList,
    pub taken_at: DateTime<Utc>,
}

impl Inventory {
    /// Build a snapshot, rejecting duplicate live `(cluster, node)` identities
    pub fn new(instances: impl Into<InstanceList>, volumes: impl Into<VolumeList>) -> Result<Self> {
        let inventory = Self {
            instances: instances.into(),
            volumes: volumes.into(),
            taken_at: Utc::now(),
        };
        inventory.check_unique_identity()?;
        Ok(inventory)
    }

    /// Filter root over all instances
    pub fn instances(&self) -> Instances {
        self.instances.view()
    }

    /// Filter root over all volumes
    pub fn volumes(&self) -> Volumes {
        self.volumes.view()
    }

    fn check_unique_identity(&self) -> Result<()> {
        let mut seen: HashSet<NodeId> = HashSet::new();
        for instance in self.instances.iter().filter(|i| i.state.is_live()) {
            let id = instance.node_id();
            if !seen.insert(id.clone()) {
                return Err(InventoryError::Backend(format!(
                    "duplicate live instance {}",
                    id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BackendType, Instance};
    use crate::state::InstanceState;

    #[test]
    fn test_duplicate_live_identity_rejected() {
        let instances = vec![
            Instance::new("mydc", 1, BackendType::Docker).with_state(InstanceState::Running),
            Instance::new("mydc", 1, BackendType::Docker).with_state(InstanceState::Stopped),
        ];
        let err = Inventory::new(instances, Vec::new()).unwrap_err();
        assert!(err.to_string().contains("mydc:1"));
    }

    #[test]
    fn test_terminated_twin_is_allowed() {
        let instances = vec![
            Instance::new("mydc", 1, BackendType::Aws).with_state(InstanceState::Terminated),
            Instance::new("mydc", 1, BackendType::Aws).with_state(InstanceState::Running),
        ];
        let inventory = Inventory::new(instances, Vec::new()).unwrap();
        assert_eq!(inventory.instances().count(), 2);
        assert_eq!(inventory.instances().live().count(), 1);
    }
}

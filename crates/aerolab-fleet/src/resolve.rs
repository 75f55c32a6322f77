//! Selection of the nodes one target acts on
//!
//! Resolution runs in a fixed order: cluster name, then live instances, then
//! the node selector, then the lifecycle gate. A missing cluster or node is
//! an error; nodes dropped by the gate are not.

use crate::error::Result;
use aerolab_inventory::{InstanceList, InstanceState, Instances, InventoryError, NodeSelector};
use tracing::debug;

/// Lifecycle requirement a command places on its nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateGate {
    /// Every live node (listing, inventory-only commands)
    Any,
    /// Only running nodes (exec, file transfer)
    #[default]
    Running,
}

/// Nodes of one cluster, narrowed by selector and gate
#[derive(Debug, Clone)]
pub struct Resolved {
    pub cluster: String,
    pub nodes: InstanceList,
    /// Nodes that matched the selector but not the gate
    pub gated_out: usize,
}

impl Resolved {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Resolve `cluster` + `selector` against a snapshot
pub fn resolve_nodes(
    instances: &Instances,
    cluster: &str,
    selector: &NodeSelector,
    gate: StateGate,
) -> Result<Resolved> {
    let live = instances.with_cluster_name([cluster]).live();
    if live.is_empty() {
        return Err(InventoryError::ClusterNotFound(cluster.to_string()).into());
    }

    let selected = match selector.nodes() {
        None => live,
        Some(requested) => {
            let selected = live.with_node_no(requested.iter().copied());
            let found = selected.node_numbers();
            if found.len() != requested.len() {
                return Err(InventoryError::NodesNotFound {
                    cluster: cluster.to_string(),
                    selector: selector.to_string(),
                    requested: requested.iter().copied().collect(),
                    found: found.into_iter().collect(),
                }
                .into());
            }
            selected
        }
    };

    let gated = match gate {
        StateGate::Any => selected.clone(),
        StateGate::Running => selected.with_state([InstanceState::Running]),
    };
    let gated_out = selected.count() - gated.count();
    debug!(
        cluster,
        selected = selected.count(),
        gated_out,
        "Resolved target nodes"
    );

    Ok(Resolved {
        cluster: cluster.to_string(),
        nodes: gated.describe(),
        gated_out,
    })
}

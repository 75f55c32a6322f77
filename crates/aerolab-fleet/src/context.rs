//! Per-invocation execution context

use crate::error::{RemoteResult, Result};
use crate::executor::{DEFAULT_PARALLEL_THREADS, FleetReport, run_fleet};
use crate::remote::{RemoteAction, Timeouts};
use crate::resolve::{StateGate, resolve_nodes};
use crate::targets::{MultiTargetReport, for_each_target};
use aerolab_inventory::{Instance, Inventory, NodeSelector};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Options shared by every fan-out of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetOptions {
    pub parallel: usize,
    pub timeouts: Timeouts,
}

impl Default for FleetOptions {
    fn default() -> Self {
        Self {
            parallel: DEFAULT_PARALLEL_THREADS,
            timeouts: Timeouts::default(),
        }
    }
}

impl FleetOptions {
    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = parallel;
        self
    }

    /// Session bound; `None` leaves the session unbounded
    pub fn with_session_timeout(mut self, session: Option<Duration>) -> Self {
        self.timeouts.session = session;
        self
    }
}

/// Everything a command needs, built once and passed by reference
pub struct ExecContext {
    pub options: FleetOptions,
    pub inventory: Inventory,
    pub remote: Arc<dyn RemoteAction>,
}

impl ExecContext {
    pub fn new(options: FleetOptions, inventory: Inventory, remote: Arc<dyn RemoteAction>) -> Self {
        Self {
            options,
            inventory,
            remote,
        }
    }

    /// Resolve one cluster and fan `unit` out over its nodes
    ///
    /// Nodes dropped by `gate` make this a logged no-op, not an error.
    pub async fn run_on_cluster<T, F, Fut>(
        &self,
        cluster: &str,
        selector: &NodeSelector,
        gate: StateGate,
        unit: F,
    ) -> Result<FleetReport<T>>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn RemoteAction>, Instance) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RemoteResult<T>> + Send + 'static,
    {
        let resolved = resolve_nodes(&self.inventory.instances(), cluster, selector, gate)?;
        if resolved.is_empty() {
            warn!(
                cluster,
                gated_out = resolved.gated_out,
                "No nodes to act on"
            );
            return Ok(FleetReport::empty());
        }

        info!(cluster, nodes = resolved.nodes.len(), "Acting on nodes");
        let remote = Arc::clone(&self.remote);
        let report = run_fleet(
            resolved.nodes.to_vec(),
            self.options.parallel,
            move |instance: Instance| unit(Arc::clone(&remote), instance),
        )
        .await;
        Ok(report)
    }

    /// [`run_on_cluster`](Self::run_on_cluster) for each target, stopping at the first fatal error
    pub async fn run_on_targets<T, F, Fut>(
        &self,
        targets: &[String],
        selector: &NodeSelector,
        gate: StateGate,
        unit: F,
    ) -> Result<MultiTargetReport<T>>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn RemoteAction>, Instance) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = RemoteResult<T>> + Send + 'static,
    {
        for_each_target(targets, |target| {
            let unit = unit.clone();
            async move { self.run_on_cluster(&target, selector, gate, unit).await }
        })
        .await
    }
}

//! Backend wiring
//!
//! Picks the inventory provider from `--backend` / `defaults.yaml` and builds
//! the remote action client that routes each node to docker exec or ssh.

use aerolab_config::{Backend, Defaults, DEFAULTS_FILE, get_config_dir};
use aerolab_docker::{DockerInventory, DockerRemote};
use aerolab_fleet::{
    ExecContext, ExecOutput, ExecRequest, FleetOptions, RemoteAction, RemoteError, RemoteResult,
    Timeouts,
};
use aerolab_inventory::{BackendType, FileInventory, Instance, Inventory, InventoryProvider};
use aerolab_ssh::{SshConfig, SshRemote};
use async_trait::async_trait;
use bollard::Docker;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Remote action client dispatching on [`Instance::backend_type`]
pub struct BackendRemote {
    docker: Option<DockerRemote>,
    ssh: SshRemote,
}

impl BackendRemote {
    pub fn new(docker: Option<Docker>, ssh: SshConfig) -> Self {
        Self {
            docker: docker.map(DockerRemote::new),
            ssh: SshRemote::new(ssh),
        }
    }

    fn client(&self, instance: &Instance) -> RemoteResult<&dyn RemoteAction> {
        match instance.backend_type {
            BackendType::Docker => match &self.docker {
                Some(docker) => Ok(docker),
                // no local daemon client for a docker node of a file inventory
                None => Err(RemoteError::Unsupported(instance.backend_type.to_string())),
            },
            BackendType::Aws | BackendType::Gcp => Ok(&self.ssh),
        }
    }
}

#[async_trait]
impl RemoteAction for BackendRemote {
    fn name(&self) -> &str {
        "router"
    }

    async fn exec(&self, instance: &Instance, request: &ExecRequest) -> RemoteResult<ExecOutput> {
        let client = self.client(instance)?;
        tracing::debug!(node = %instance.node_id(), client = client.name(), "exec");
        client.exec(instance, request).await
    }

    async fn upload(
        &self,
        instance: &Instance,
        source: &Path,
        dest: &str,
        permissions: u32,
        timeouts: Timeouts,
    ) -> RemoteResult<()> {
        self.client(instance)?
            .upload(instance, source, dest, permissions, timeouts)
            .await
    }

    async fn download(
        &self,
        instance: &Instance,
        source: &str,
        dest: &Path,
        timeouts: Timeouts,
    ) -> RemoteResult<()> {
        self.client(instance)?
            .download(instance, source, dest, timeouts)
            .await
    }
}

/// Resolved configuration of one invocation
pub struct Setup {
    backend: Backend,
    defaults: Defaults,
    config_dir: PathBuf,
    inventory_file: PathBuf,
}

impl Setup {
    /// Merge command line flags over `defaults.yaml`
    pub fn load(backend: Option<Backend>, inventory: Option<PathBuf>) -> anyhow::Result<Self> {
        let config_dir = get_config_dir()?;
        let defaults = Defaults::load_from(config_dir.join(DEFAULTS_FILE))?;
        let backend = backend.unwrap_or(defaults.backend);
        let inventory_file = inventory.unwrap_or_else(|| defaults.inventory_file(&config_dir));
        tracing::debug!(%backend, config_dir = %config_dir.display(), "Loaded defaults");

        Ok(Self {
            backend,
            defaults,
            config_dir,
            inventory_file,
        })
    }

    /// Take an inventory snapshot from the selected backend
    pub async fn snapshot(&self) -> anyhow::Result<Inventory> {
        let provider: Box<dyn InventoryProvider> = match self.backend {
            Backend::Docker => Box::new(DockerInventory::new(
                aerolab_docker::connect().await?,
                self.defaults.docker_project.clone(),
            )),
            Backend::File => Box::new(FileInventory::new(&self.inventory_file)),
        };

        let inventory = provider.snapshot().await?;
        tracing::debug!(
            provider = provider.name(),
            instances = inventory.instances.len(),
            volumes = inventory.volumes.len(),
            "Inventory loaded"
        );
        Ok(inventory)
    }

    /// Execution context for a fan-out command
    ///
    /// `session` overrides the configured session timeout; `Some(None)` lifts it.
    pub fn context(
        &self,
        inventory: Inventory,
        parallel: Option<usize>,
        session: Option<Option<Duration>>,
    ) -> ExecContext {
        let options = FleetOptions {
            parallel: parallel.unwrap_or(self.defaults.parallel_threads),
            timeouts: Timeouts {
                connect: self.defaults.connect_timeout(),
                session: session.unwrap_or_else(|| self.defaults.session_timeout()),
            },
        };

        // the client is lazy; a missing daemon surfaces per node
        let docker = Docker::connect_with_local_defaults()
            .inspect_err(|e| tracing::debug!("Docker client unavailable: {}", e))
            .ok();
        let ssh = SshConfig {
            user: self.defaults.ssh_user.clone(),
            key_dir: self.defaults.ssh_key_dir(&self.config_dir),
            ..SshConfig::default()
        };

        ExecContext::new(options, inventory, Arc::new(BackendRemote::new(docker, ssh)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_docker_node_without_client_is_unsupported() {
        let remote = BackendRemote::new(None, SshConfig::default());
        let node = Instance::new("mydc", 1, BackendType::Docker);

        let err = remote
            .exec(&node, &ExecRequest::new(["true"]))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Unsupported(m) if m == "docker"));
    }

    #[test]
    fn test_cloud_nodes_route_to_ssh() {
        let remote = BackendRemote::new(None, SshConfig::default());
        for backend in [BackendType::Aws, BackendType::Gcp] {
            let node = Instance::new("mydc", 1, backend);
            assert_eq!(remote.client(&node).unwrap().name(), "ssh");
        }
    }
}

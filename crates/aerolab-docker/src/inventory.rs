//! Inventory population from container and volume labels

use aerolab_inventory::tags::{
    TAG_AEROLAB_PROJECT, TAG_CLUSTER_NAME, TAG_EXPIRES, TAG_NODE_NO, TAG_OS_NAME, TAG_OS_VERSION,
    TAG_OWNER,
};
use aerolab_inventory::{
    BackendType, Instance, InstanceState, Inventory, InventoryError, InventoryProvider,
    OperatingSystem, Result, Volume, VolumeState,
};
use async_trait::async_trait;
use bollard::Docker;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Container fields used by the inventory, in Docker API naming
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerRecord {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    pub labels: HashMap<String, String>,
    pub state: String,
    pub created: i64,
    pub network_settings: Option<NetworkRecord>,
    pub mounts: Vec<MountRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NetworkRecord {
    pub networks: BTreeMap<String, EndpointRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EndpointRecord {
    #[serde(rename = "IPAddress")]
    pub ip_address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MountRecord {
    #[serde(rename = "Type")]
    pub kind: String,
    pub name: String,
}

/// Volume fields used by the inventory, in Docker API naming
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VolumeRecord {
    pub name: String,
    pub labels: HashMap<String, String>,
    pub created_at: String,
}

/// Lifecycle state of a container state string
pub fn container_state(state: &str) -> InstanceState {
    match state.to_ascii_lowercase().as_str() {
        "running" => InstanceState::Running,
        "exited" => InstanceState::Stopped,
        "created" | "restarting" => InstanceState::Pending,
        "dead" => InstanceState::Fail,
        "removing" => InstanceState::Terminating,
        _ => InstanceState::Unknown,
    }
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Build an instance from a labelled container; `None` when it is not a cluster node
pub fn instance_from_container(record: &ContainerRecord) -> Option<Instance> {
    let cluster = record.labels.get(TAG_CLUSTER_NAME)?;
    let node_no: u32 = match record.labels.get(TAG_NODE_NO)?.parse() {
        Ok(n) => n,
        Err(_) => {
            tracing::debug!(container = %record.id, "Skipping container with invalid node number label");
            return None;
        }
    };

    let mut instance = Instance::new(cluster.clone(), node_no, BackendType::Docker)
        .with_state(container_state(&record.state));

    instance.instance_id = record.id.clone();
    if let Some(name) = record.names.first() {
        instance.name = name.trim_start_matches('/').to_string();
    }
    instance.instance_type = record.image.clone();
    instance.owner = record.labels.get(TAG_OWNER).cloned().unwrap_or_default();
    instance.tags = record.labels.clone();
    instance.expires = record.labels.get(TAG_EXPIRES).and_then(|v| parse_time(v));
    instance.operating_system = OperatingSystem {
        name: record.labels.get(TAG_OS_NAME).cloned().unwrap_or_default(),
        version: record.labels.get(TAG_OS_VERSION).cloned().unwrap_or_default(),
    };
    if let Some(created) = DateTime::from_timestamp(record.created, 0) {
        instance.creation_time = created;
    }
    // first network by name
    if let Some(endpoint) = record
        .network_settings
        .as_ref()
        .and_then(|ns| ns.networks.values().find(|e| !e.ip_address.is_empty()))
    {
        instance.ip.private = endpoint.ip_address.clone();
    }

    Some(instance)
}

/// Build a volume, attached to every container that mounts it
pub fn volume_from_record(record: &VolumeRecord, containers: &[ContainerRecord]) -> Volume {
    let attached: Vec<String> = containers
        .iter()
        .filter(|c| {
            c.mounts
                .iter()
                .any(|m| m.kind == "volume" && m.name == record.name)
        })
        .map(|c| c.id.clone())
        .collect();

    let mut volume = Volume::new(record.name.clone(), BackendType::Docker).with_state(
        if attached.is_empty() {
            VolumeState::Available
        } else {
            VolumeState::InUse
        },
    );
    volume.attached_to = attached;
    volume.owner = record.labels.get(TAG_OWNER).cloned().unwrap_or_default();
    volume.tags = record.labels.clone();
    volume.expires = record.labels.get(TAG_EXPIRES).and_then(|v| parse_time(v));
    if let Some(created) = parse_time(&record.created_at) {
        volume.creation_time = created;
    }
    volume
}

/// Does this label set belong to the project (any project when `None`)?
pub fn in_project(labels: &HashMap<String, String>, project: Option<&str>) -> bool {
    match (labels.get(TAG_AEROLAB_PROJECT), project) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(value), Some(project)) => value == project,
    }
}

fn to_record<S: serde::Serialize, R: for<'de> Deserialize<'de>>(summary: &S) -> Result<R> {
    let value = serde_json::to_value(summary)?;
    Ok(serde_json::from_value(value)?)
}

/// Docker inventory provider
pub struct DockerInventory {
    docker: Docker,
    project: Option<String>,
}

impl DockerInventory {
    pub fn new(docker: Docker, project: Option<String>) -> Self {
        Self { docker, project }
    }

    async fn containers(&self) -> Result<Vec<ContainerRecord>> {
        let mut filters = HashMap::new();
        filters.insert("label".to_string(), vec![TAG_AEROLAB_PROJECT.to_string()]);

        #[allow(deprecated)]
        let options = bollard::container::ListContainersOptions {
            all: true,
            filters,
            ..Default::default()
        };

        #[allow(deprecated)]
        let summaries = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| InventoryError::Backend(format!("docker list containers: {}", e)))?;

        let mut records = Vec::with_capacity(summaries.len());
        for summary in &summaries {
            let record: ContainerRecord = to_record(summary)?;
            if in_project(&record.labels, self.project.as_deref()) {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn volumes(&self) -> Result<Vec<VolumeRecord>> {
        let response = self
            .docker
            .list_volumes(None::<bollard::query_parameters::ListVolumesOptions>)
            .await
            .map_err(|e| InventoryError::Backend(format!("docker list volumes: {}", e)))?;

        let mut records = Vec::new();
        for volume in response.volumes.unwrap_or_default() {
            let record: VolumeRecord = to_record(&volume)?;
            if in_project(&record.labels, self.project.as_deref()) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl InventoryProvider for DockerInventory {
    fn name(&self) -> &str {
        "docker"
    }

    async fn snapshot(&self) -> Result<Inventory> {
        let containers = self.containers().await?;
        let volumes = self.volumes().await?;

        let instances: Vec<Instance> = containers.iter().filter_map(instance_from_container).collect();
        let volumes: Vec<Volume> = volumes
            .iter()
            .map(|v| volume_from_record(v, &containers))
            .collect();

        tracing::debug!(
            instances = instances.len(),
            volumes = volumes.len(),
            "Read docker inventory"
        );
        Inventory::new(instances, volumes)
    }
}

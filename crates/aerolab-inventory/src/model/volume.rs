//! Volume definition

use super::{BackendType, Identify};
use crate::state::VolumeState;
use crate::tags::{self, AgiSources};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const GIB: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeType {
    /// Block device attached to a single instance (pd-ssd, ebs, docker volume)
    #[default]
    AttachedDisk,
    /// Network filesystem mountable from many instances (efs)
    SharedDisk,
}

impl std::fmt::Display for VolumeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VolumeType::AttachedDisk => write!(f, "AttachedDisk"),
            VolumeType::SharedDisk => write!(f, "SharedDisk"),
        }
    }
}

/// One disk or shared filesystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    pub backend_type: BackendType,
    #[serde(default)]
    pub zone_name: String,
    #[serde(default)]
    pub volume_type: VolumeType,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    pub state: VolumeState,
    /// Instance IDs, empty when detached
    #[serde(default)]
    pub attached_to: Vec<String>,
    #[serde(default)]
    pub delete_on_termination: bool,
    pub creation_time: DateTime<Utc>,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
}

impl Volume {
    pub fn new(name: impl Into<String>, backend_type: BackendType) -> Self {
        Self {
            name: name.into(),
            backend_type,
            zone_name: String::new(),
            volume_type: VolumeType::default(),
            size: 0,
            owner: String::new(),
            tags: HashMap::new(),
            state: VolumeState::Unknown,
            attached_to: Vec::new(),
            delete_on_termination: false,
            creation_time: Utc::now(),
            expires: None,
        }
    }

    pub fn with_state(mut self, state: VolumeState) -> Self {
        self.state = state;
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_size_gib(mut self, gib: u64) -> Self {
        self.size = gib * GIB;
        self
    }

    pub fn attached(mut self, instance_id: impl Into<String>) -> Self {
        self.attached_to.push(instance_id.into());
        self
    }

    /// Size normalized to GiB for display
    pub fn size_gib(&self) -> f64 {
        self.size as f64 / GIB as f64
    }

    pub fn is_attached(&self) -> bool {
        !self.attached_to.is_empty()
    }

    /// Only detached, available volumes may be deleted
    pub fn is_deletable(&self) -> bool {
        self.state == VolumeState::Available && !self.is_attached()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    pub fn agi_label(&self) -> String {
        self.tags
            .get(tags::TAG_AGI_LABEL)
            .map(|v| tags::decode_base64_tag(v))
            .unwrap_or_default()
    }

    pub fn agi_sources(&self) -> AgiSources {
        AgiSources::from_tags(&self.tags)
    }
}

impl Identify for Volume {
    fn identity(&self) -> String {
        if self.zone_name.is_empty() {
            self.name.clone()
        } else {
            format!("{}@{}", self.name, self.zone_name)
        }
    }
}

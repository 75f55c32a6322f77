//! Instance definition

use super::{BackendType, Identify};
use crate::state::InstanceState;
use crate::tags::{self, AgiSources};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Public and private addresses of an instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ip {
    #[serde(default)]
    pub public: String,
    #[serde(default)]
    pub private: String,
}

impl Ip {
    /// Public address if there is one, private otherwise
    pub fn routable(&self) -> &str {
        if self.public.is_empty() {
            &self.private
        } else {
            &self.public
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingSystem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// `(cluster_name, node_no)`, unique among the live instances of a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub cluster_name: String,
    pub node_no: u32,
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.cluster_name, self.node_no)
    }
}

/// One server or client node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub cluster_name: String,
    pub node_no: u32,
    #[serde(default)]
    pub instance_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ip: Ip,
    #[serde(default)]
    pub owner: String,
    pub backend_type: BackendType,
    #[serde(default)]
    pub zone_name: String,
    #[serde(default)]
    pub instance_type: String,
    #[serde(default)]
    pub spot_instance: bool,
    pub creation_time: DateTime<Utc>,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    pub state: InstanceState,
    #[serde(default)]
    pub operating_system: OperatingSystem,
}

impl Instance {
    pub fn new(cluster_name: impl Into<String>, node_no: u32, backend_type: BackendType) -> Self {
        let cluster_name = cluster_name.into();
        Self {
            name: format!("{}-{}", cluster_name, node_no),
            cluster_name,
            node_no,
            instance_id: String::new(),
            ip: Ip::default(),
            owner: String::new(),
            backend_type,
            zone_name: String::new(),
            instance_type: String::new(),
            spot_instance: false,
            creation_time: Utc::now(),
            expires: None,
            tags: HashMap::new(),
            state: InstanceState::Unknown,
            operating_system: OperatingSystem::default(),
        }
    }

    pub fn with_state(mut self, state: InstanceState) -> Self {
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

    pub fn with_private_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip.private = ip.into();
        self
    }

    pub fn with_public_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip.public = ip.into();
        self
    }

    pub fn node_id(&self) -> NodeId {
        NodeId {
            cluster_name: self.cluster_name.clone(),
            node_no: self.node_no,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    /// Software type from the `aerolab.type` tag
    pub fn soft_type(&self) -> Option<&str> {
        self.tags.get(tags::TAG_SOFT_TYPE).map(String::as_str)
    }

    /// Human label of an AGI instance
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

impl Identify for Instance {
    fn identity(&self) -> String {
        self.node_id().to_string()
    }
}

//! Resource model
//!
//! Value types describing one cloud resource each. Instances and volumes are
//! produced by an [`InventoryProvider`](crate::InventoryProvider) and are never
//! mutated once they are part of a snapshot.

mod instance;
mod volume;

pub use instance::*;
pub use volume::*;

use serde::{Deserialize, Serialize};

/// Backend that owns a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    Aws,
    Gcp,
    Docker,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendType::Aws => write!(f, "aws"),
            BackendType::Gcp => write!(f, "gcp"),
            BackendType::Docker => write!(f, "docker"),
        }
    }
}

/// Stable, human-readable identity of a resource, used in logs and joined errors
pub trait Identify {
    fn identity(&self) -> String;
}

//! AeroLab Inventory
//!
//! Resource model, lifecycle states and the filter algebra used by every
//! fleet command to pick the instances and volumes it acts on.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  aerolab CLI                     │
//! │        (cluster / attach / files / logs)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               aerolab-inventory                  │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │         Provider Abstraction              │   │
//! │  │  trait InventoryProvider { ... }          │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Filter views │  │  Selectors   │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │    docker     │ │ snapshot file │
//! │   provider    │ │   provider    │
//! └───────────────┘ └───────────────┘
//! ```

pub mod error;
pub mod filter;
pub mod model;
pub mod provider;
pub mod selector;
pub mod snapshot;
pub mod state;
pub mod tags;

// Re-exports
pub use error::{InventoryError, Result};
pub use filter::{InstanceList, Instances, ResourceList, View, VolumeList, Volumes};
pub use model::{
    BackendType, Identify, Instance, Ip, NodeId, OperatingSystem, Volume, VolumeType,
};
pub use provider::{Inventory, InventoryProvider};
pub use selector::{NodeSelector, expand_node_selector, expand_target_list};
pub use snapshot::{FileInventory, SnapshotFile, SnapshotStore};
pub use state::{InstanceState, VolumeState};

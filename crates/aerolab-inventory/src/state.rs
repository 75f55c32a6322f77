//! Lifecycle states for inventory resources
//!
//! States are reported by the backend that populated the inventory. Nothing in
//! this crate moves a resource between states; the transition tables exist so
//! that a refreshed snapshot can be checked against the previous one and so
//! that commands can gate actions on the state they read.

use crate::error::InventoryError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle state of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InstanceState {
    /// Being created or booting
    Pending,
    /// Up and reachable
    Running,
    /// Shutting down
    Stopping,
    /// Powered off, can be started again
    Stopped,
    /// Being destroyed
    Terminating,
    /// Gone; absorbing
    Terminated,
    /// Backend reports a failure
    Fail,
    /// Backend reported a state we do not model
    Unknown,
}

impl InstanceState {
    pub const ALL: [InstanceState; 8] = [
        InstanceState::Pending,
        InstanceState::Running,
        InstanceState::Stopping,
        InstanceState::Stopped,
        InstanceState::Terminating,
        InstanceState::Terminated,
        InstanceState::Fail,
        InstanceState::Unknown,
    ];

    /// Terminated is the only absorbing state
    pub fn is_terminal(self) -> bool {
        self == InstanceState::Terminated
    }

    /// Live instances are the ones list-style commands show by default
    pub fn is_live(self) -> bool {
        !matches!(self, InstanceState::Terminating | InstanceState::Terminated)
    }

    /// Whether a backend may legally report `next` after `self`
    pub fn can_transition_to(self, next: InstanceState) -> bool {
        use InstanceState::*;
        if self == next {
            return true;
        }
        match (self, next) {
            (Terminated, _) => false,
            (_, Fail | Unknown) => true,
            (Pending, Running) => true,
            (Running, Stopping | Stopped | Terminating) => true,
            (Stopping, Stopped | Running) => true,
            (Stopped, Pending | Running | Terminating) => true,
            (Terminating, Terminated) => true,
            (Fail | Unknown, Pending | Running | Stopped | Terminating | Terminated) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceState::Pending => write!(f, "Pending"),
            InstanceState::Running => write!(f, "Running"),
            InstanceState::Stopping => write!(f, "Stopping"),
            InstanceState::Stopped => write!(f, "Stopped"),
            InstanceState::Terminating => write!(f, "Terminating"),
            InstanceState::Terminated => write!(f, "Terminated"),
            InstanceState::Fail => write!(f, "Fail"),
            InstanceState::Unknown => write!(f, "Unknown"),
        }
    }
}

impl FromStr for InstanceState {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InstanceState::ALL
            .into_iter()
            .find(|state| state.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| InventoryError::UnknownState {
                kind: "instance",
                value: s.to_string(),
            })
    }
}

/// Lifecycle state of a volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VolumeState {
    Creating,
    /// Created and not attached to anything
    Available,
    /// Attached to one or more instances
    InUse,
    Deleting,
    /// Gone; absorbing
    Deleted,
    Fail,
    Unknown,
}

impl VolumeState {
    pub const ALL: [VolumeState; 7] = [
        VolumeState::Creating,
        VolumeState::Available,
        VolumeState::InUse,
        VolumeState::Deleting,
        VolumeState::Deleted,
        VolumeState::Fail,
        VolumeState::Unknown,
    ];

    pub fn is_terminal(self) -> bool {
        self == VolumeState::Deleted
    }

    pub fn is_live(self) -> bool {
        !matches!(self, VolumeState::Deleting | VolumeState::Deleted)
    }

    pub fn can_transition_to(self, next: VolumeState) -> bool {
        use VolumeState::*;
        if self == next {
            return true;
        }
        match (self, next) {
            (Deleted, _) => false,
            (_, Fail | Unknown) => true,
            (Creating, Available) => true,
            (Available, InUse | Deleting) => true,
            (InUse, Available | Deleting) => true,
            (Deleting, Deleted) => true,
            (Fail | Unknown, Available | InUse | Deleting | Deleted) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for VolumeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VolumeState::Creating => write!(f, "Creating"),
            VolumeState::Available => write!(f, "Available"),
            VolumeState::InUse => write!(f, "InUse"),
            VolumeState::Deleting => write!(f, "Deleting"),
            VolumeState::Deleted => write!(f, "Deleted"),
            VolumeState::Fail => write!(f, "Fail"),
            VolumeState::Unknown => write!(f, "Unknown"),
        }
    }
}

impl FromStr for VolumeState {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VolumeState::ALL
            .into_iter()
            .find(|state| state.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| InventoryError::UnknownState {
                kind: "volume",
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_terminated_is_absorbing() {
        for next in InstanceState::ALL {
            if next == InstanceState::Terminated {
                continue;
            }
            assert!(!InstanceState::Terminated.can_transition_to(next), "{next}");
        }
        assert!(InstanceState::Terminated.is_terminal());
        assert!(!InstanceState::Terminated.is_live());
    }

    #[test]
    fn test_instance_legal_edges() {
        use InstanceState::*;
        assert!(Pending.can_transition_to(Running));
        assert!(Running.can_transition_to(Stopping));
        assert!(Stopping.can_transition_to(Stopped));
        assert!(Stopped.can_transition_to(Running));
        assert!(Running.can_transition_to(Terminating));
        assert!(Stopped.can_transition_to(Terminating));
        assert!(Terminating.can_transition_to(Terminated));

        assert!(!Pending.can_transition_to(Terminated));
        assert!(!Running.can_transition_to(Terminated));
        assert!(!Terminating.can_transition_to(Running));
    }

    #[test]
    fn test_volume_deleted_is_absorbing() {
        use VolumeState::*;
        assert!(Creating.can_transition_to(Available));
        assert!(Available.can_transition_to(InUse));
        assert!(InUse.can_transition_to(Available));
        assert!(InUse.can_transition_to(Deleting));
        assert!(Deleting.can_transition_to(Deleted));
        assert!(!Deleted.can_transition_to(Available));
        assert!(!Creating.can_transition_to(Deleted));
        assert!(!Deleting.is_live());
    }

    #[test]
    fn test_state_string_round_trip() {
        for state in InstanceState::ALL {
            assert_eq!(state.to_string().parse::<InstanceState>().unwrap(), state);
        }
        for state in VolumeState::ALL {
            assert_eq!(state.to_string().parse::<VolumeState>().unwrap(), state);
        }
        assert_eq!("running".parse::<InstanceState>().unwrap(), InstanceState::Running);
        assert!("sleeping".parse::<InstanceState>().is_err());
    }

    #[test]
    fn test_state_serde_uses_canonical_names() {
        let json = serde_json::to_string(&InstanceState::Stopped).unwrap();
        assert_eq!(json, "\"Stopped\"");
        let state: VolumeState = serde_json::from_str("\"InUse\"").unwrap();
        assert_eq!(state, VolumeState::InUse);
    }
}

//! Inventory error types

use thiserror::Error;

/// Inventory errors
#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Invalid node selector token '{token}': {reason}")]
    InvalidSelector { token: String, reason: String },

    #[error("Cluster {0} not found")]
    ClusterNotFound(String),

    #[error(
        "Some nodes in {cluster} not found: {selector} (requested: {requested:?}, found: {found:?})"
    )]
    NodesNotFound {
        cluster: String,
        selector: String,
        requested: Vec<u32>,
        found: Vec<u32>,
    },

    #[error("Unknown {kind} state: {value}")]
    UnknownState { kind: &'static str, value: String },

    #[error("Inventory backend error: {0}")]
    Backend(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InventoryError {
    pub fn invalid_selector(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Malformed user input, never worth retrying
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidSelector { .. })
    }

    /// The requested cluster or node is absent from the inventory
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ClusterNotFound(_) | Self::NodesNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, InventoryError>;

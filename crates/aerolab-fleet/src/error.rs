//! Fleet error types

use aerolab_inventory::InventoryError;
use std::time::Duration;
use thiserror::Error;

/// Phase of a remote call a timeout applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPhase {
    Connect,
    Session,
}

impl std::fmt::Display for TimeoutPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeoutPhase::Connect => write!(f, "connect"),
            TimeoutPhase::Session => write!(f, "session"),
        }
    }
}

/// Failure of one remote action against one resource
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("{phase} timeout after {}s", .limit.as_secs())]
    Timeout { phase: TimeoutPhase, limit: Duration },

    #[error("Command exited with code {code}: {stderr}")]
    ExitStatus { code: i64, stderr: String },

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("Remote actions are not supported for {0} instances")]
    Unsupported(String),

    #[error("Worker panicked: {0}")]
    WorkerPanic(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoteError {
    pub fn connect_timeout(limit: Duration) -> Self {
        Self::Timeout {
            phase: TimeoutPhase::Connect,
            limit,
        }
    }

    pub fn session_timeout(limit: Duration) -> Self {
        Self::Timeout {
            phase: TimeoutPhase::Session,
            limit,
        }
    }

    /// Non-zero exit, keeping only the tail of stderr
    pub fn exit_status(code: i64, stderr: &[u8]) -> Self {
        const TAIL: usize = 512;
        let text = String::from_utf8_lossy(stderr);
        let text = text.trim();
        let start = text
            .char_indices()
            .rev()
            .nth(TAIL.saturating_sub(1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        Self::ExitStatus {
            code,
            stderr: text[start..].to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Per-resource failures of one or more fan-outs
///
/// Holds `(identity, error)` pairs in the order they were recorded. The
/// message joins every pair as `identity: error`, one per line.
#[derive(Debug)]
pub struct AggregateError<E = RemoteError> {
    failures: Vec<(String, E)>,
}

impl<E> Default for AggregateError<E> {
    fn default() -> Self {
        Self {
            failures: Vec::new(),
        }
    }
}

impl<E> AggregateError<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, identity: impl Into<String>, error: E) {
        self.failures.push((identity.into(), error));
    }

    /// Append every failure of `other`
    pub fn merge(&mut self, other: AggregateError<E>) {
        self.failures.extend(other.failures);
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> + '_ {
        self.failures.iter().map(|(identity, _)| identity.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &E)> + '_ {
        self.failures.iter().map(|(identity, e)| (identity.as_str(), e))
    }

    pub fn get(&self, identity: &str) -> Option<&E> {
        self.failures
            .iter()
            .find(|(id, _)| id == identity)
            .map(|(_, e)| e)
    }

    /// `None` when nothing failed
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}

impl<E> FromIterator<(String, E)> for AggregateError<E> {
    fn from_iter<I: IntoIterator<Item = (String, E)>>(iter: I) -> Self {
        Self {
            failures: iter.into_iter().collect(),
        }
    }
}

impl<E> IntoIterator for AggregateError<E> {
    type Item = (String, E);
    type IntoIter = std::vec::IntoIter<(String, E)>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}

impl<E: std::fmt::Display> std::fmt::Display for AggregateError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (identity, error)) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", identity, error)?;
        }
        Ok(())
    }
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for AggregateError<E> {}

/// Command-level errors
#[derive(Error, Debug)]
pub enum FleetError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Timeout(String),

    #[error("Some nodes failed:\n{0}")]
    PartialFailure(AggregateError),

    #[error("{0}")]
    Backend(String),
}

impl FleetError {
    /// Fatal errors abort a multi-target run; partial failures do not
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::PartialFailure(_))
    }
}

impl From<InventoryError> for FleetError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InvalidSelector { .. } | InventoryError::UnknownState { .. } => {
                Self::Validation(err.to_string())
            }
            InventoryError::ClusterNotFound(_) | InventoryError::NodesNotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            InventoryError::Backend(_)
            | InventoryError::Snapshot(_)
            | InventoryError::Io(_)
            | InventoryError::Json(_) => Self::Backend(err.to_string()),
        }
    }
}

impl From<AggregateError> for FleetError {
    fn from(err: AggregateError) -> Self {
        Self::PartialFailure(err)
    }
}

/// Single-resource remote calls made outside a fan-out
impl From<RemoteError> for FleetError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Timeout { .. } => Self::Timeout(err.to_string()),
            RemoteError::Unsupported(_) => Self::Validation(err.to_string()),
            _ => Self::Backend(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_message_names_every_identity() {
        let mut errors = AggregateError::new();
        errors.push("mydc:2", RemoteError::Connect("refused".to_string()));
        errors.push("mydc:4", RemoteError::session_timeout(Duration::from_secs(30)));

        let message = errors.to_string();
        assert!(message.contains("mydc:2: Connection failed: refused"));
        assert!(message.contains("mydc:4: session timeout after 30s"));
        assert_eq!(errors.identities().collect::<Vec<_>>(), ["mydc:2", "mydc:4"]);
        assert!(errors.get("mydc:4").unwrap().is_timeout());
    }

    #[test]
    fn test_merge_is_associative_in_content() {
        let make = |id: &str| {
            let mut e = AggregateError::new();
            e.push(id, RemoteError::Transfer(id.to_string()));
            e
        };

        let mut left = make("a:1");
        let mut bc = make("b:1");
        bc.merge(make("c:1"));
        left.merge(bc);

        let mut ab = make("a:1");
        ab.merge(make("b:1"));
        ab.merge(make("c:1"));

        let mut l: Vec<_> = left.identities().collect();
        let mut r: Vec<_> = ab.identities().collect();
        l.sort();
        r.sort();
        assert_eq!(l, r);
    }

    #[test]
    fn test_empty_aggregate_is_none() {
        assert!(AggregateError::<RemoteError>::new().into_option().is_none());
    }

    #[test]
    fn test_exit_status_keeps_stderr_tail() {
        let long = "x".repeat(2000) + "boom";
        let err = RemoteError::exit_status(2, long.as_bytes());
        match err {
            RemoteError::ExitStatus { code, stderr } => {
                assert_eq!(code, 2);
                assert_eq!(stderr.len(), 512);
                assert!(stderr.ends_with("boom"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_inventory_errors_map_by_category() {
        let err: FleetError = InventoryError::ClusterNotFound("bad".to_string()).into();
        assert!(matches!(err, FleetError::NotFound(_)));
        assert!(err.is_fatal());

        let err: FleetError = InventoryError::invalid_selector("abc", "not a number").into();
        assert!(matches!(err, FleetError::Validation(_)));

        let err: FleetError = InventoryError::Backend("docker down".to_string()).into();
        assert!(matches!(err, FleetError::Backend(_)));

        let err: FleetError = AggregateError::new().into();
        assert!(!err.is_fatal());
    }
}

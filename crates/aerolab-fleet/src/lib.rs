//! AeroLab Fleet
//!
//! Runs one unit of remote work on every selected node of one or more
//! clusters. Within a cluster all nodes are attempted and failures are
//! joined; across clusters the first fatal error stops the run.
//!
//! ```text
//!  "-n mydc,mydc2 -l 1-3"
//!          │
//!  ┌───────▼────────┐   fail-fast
//!  │ for_each_target├──────────────► FleetError
//!  └───────┬────────┘
//!          │ per cluster
//!  ┌───────▼────────┐
//!  │ resolve_nodes  │ cluster → live → selector → state gate
//!  └───────┬────────┘
//!  ┌───────▼────────┐   best-effort
//!  │   run_fleet    ├──────────────► AggregateError
//!  └───────┬────────┘
//!          │ per node
//!  ┌───────▼────────┐
//!  │  RemoteAction  │ exec / upload / download
//!  └────────────────┘
//! ```

pub mod context;
pub mod error;
pub mod executor;
pub mod hosts;
pub mod remote;
pub mod resolve;
pub mod targets;

// Re-exports
pub use context::{ExecContext, FleetOptions};
pub use error::{AggregateError, FleetError, RemoteError, RemoteResult, Result, TimeoutPhase};
pub use executor::{DEFAULT_PARALLEL_THREADS, FleetReport, Outcome, run_fleet};
pub use remote::{ExecOutput, ExecRequest, RemoteAction, Timeouts, shell_quote};
pub use resolve::{Resolved, StateGate, resolve_nodes};
pub use targets::{MultiTargetReport, TargetReport, for_each_target};

//! AeroLab SSH client
//!
//! Remote actions for cloud instances, driven through the system `ssh` and
//! `scp` binaries with connect and session timeouts.

pub mod command;
pub mod remote;

pub use command::run_process;
pub use remote::{SshConfig, SshRemote};

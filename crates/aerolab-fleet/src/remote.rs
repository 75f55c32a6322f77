//! Remote action client trait definition

use crate::error::{RemoteError, RemoteResult};
use aerolab_inventory::Instance;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Connect and session bounds of one remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    /// `None` for unbounded (interactive or follow) sessions
    pub session: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            session: Some(Duration::from_secs(600)),
        }
    }
}

/// Command execution request
#[derive(Debug, Clone, Default)]
pub struct ExecRequest {
    /// argv; a single element is run through the remote shell
    pub command: Vec<String>,
    pub stdin: Option<Vec<u8>>,
    pub timeouts: Timeouts,
    /// Attach local stdio directly instead of capturing output
    pub interactive: bool,
}

impl ExecRequest {
    pub fn new<S: Into<String>>(command: impl IntoIterator<Item = S>) -> Self {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Run a script through `/bin/sh -c`
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new(["/bin/sh".to_string(), "-c".to_string(), script.into()])
    }

    pub fn with_stdin(mut self, stdin: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// The lone element of a one-element command, which backends run as a script
    pub fn script(&self) -> Option<&str> {
        match self.command.as_slice() {
            [script] => Some(script),
            _ => None,
        }
    }

    /// Command line for logs and shells that take a single string
    pub fn command_line(&self) -> String {
        self.command
            .iter()
            .map(|arg| shell_quote(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i64,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a non-zero exit into [`RemoteError::ExitStatus`]
    pub fn check(self) -> RemoteResult<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(RemoteError::exit_status(self.exit_code, &self.stderr))
        }
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Remote action abstraction
///
/// Implementations open their own connection per call, so one client can
/// be shared by all workers of a fan-out without sharing sessions.
#[async_trait]
pub trait RemoteAction: Send + Sync {
    /// Returns the client name (e.g., "docker", "ssh")
    fn name(&self) -> &str;

    /// Execute a command; a non-zero exit is reported in the output, not as an error
    async fn exec(&self, instance: &Instance, request: &ExecRequest) -> RemoteResult<ExecOutput>;

    /// Copy a local file to `dest` on the instance and set its mode
    async fn upload(
        &self,
        instance: &Instance,
        source: &Path,
        dest: &str,
        permissions: u32,
        timeouts: Timeouts,
    ) -> RemoteResult<()>;

    /// Copy `source` on the instance to a local file
    async fn download(
        &self,
        instance: &Instance,
        source: &str,
        dest: &Path,
        timeouts: Timeouts,
    ) -> RemoteResult<()>;
}

/// Single-quote an argument for a POSIX shell unless it is plainly safe
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@%+".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r#"'\''"#))
    }
}

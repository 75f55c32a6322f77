//! ssh / scp process wrapper
//!
//! Wraps the system OpenSSH client. Each call spawns its own process and
//! therefore its own connection.

use aerolab_fleet::{ExecOutput, RemoteError, RemoteResult, Timeouts};
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

/// Exit code OpenSSH uses for its own (connection) errors
pub const SSH_ERROR_EXIT: i64 = 255;

/// Run `program` with `args`; feeding stdin and waiting share the session bound
pub async fn run_process(
    program: &str,
    args: &[String],
    stdin: Option<&[u8]>,
    interactive: bool,
    timeouts: Timeouts,
) -> RemoteResult<ExecOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args).kill_on_drop(true);
    if interactive {
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
    } else {
        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    }

    tracing::debug!("Running: {} {}", program, args.join(" "));

    let mut child = cmd
        .spawn()
        .map_err(|e| RemoteError::Connect(format!("failed to start {}: {}", program, e)))?;

    let pipe = child.stdin.take();
    let feed = async move {
        if let (Some(data), Some(mut pipe)) = (stdin, pipe) {
            pipe.write_all(data).await?;
            pipe.shutdown().await?;
        }
        Ok::<_, std::io::Error>(())
    };
    let session = async move {
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        match fed {
            // the command exited without reading all of stdin
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
            other => other?,
        }
        Ok::<_, std::io::Error>(output)
    };

    let output = match timeouts.session {
        // the connect phase runs inside the same process
        Some(limit) => {
            let bound = limit + timeouts.connect;
            timeout(bound, session)
                .await
                .map_err(|_| RemoteError::session_timeout(bound))??
        }
        None => session.await?,
    };

    Ok(ExecOutput {
        stdout: output.stdout,
        stderr: output.stderr,
        exit_code: output.status.code().map(i64::from).unwrap_or(-1),
    })
}

/// Separate OpenSSH's own failures from the remote command's exit status
pub fn classify_ssh_failure(output: ExecOutput, timeouts: Timeouts) -> RemoteResult<ExecOutput> {
    if output.exit_code != SSH_ERROR_EXIT {
        return Ok(output);
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.contains("timed out") {
        Err(RemoteError::connect_timeout(timeouts.connect))
    } else if stderr.is_empty() {
        Ok(output)
    } else {
        Err(RemoteError::Connect(stderr))
    }
}

//! Remote actions through docker exec

use aerolab_fleet::{ExecOutput, ExecRequest, RemoteAction, RemoteError, RemoteResult, Timeouts, shell_quote};
use aerolab_inventory::Instance;
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::LogOutput;
use bollard::exec::{CreateExecOptions, StartExecOptions, StartExecResults};
use futures_util::stream::StreamExt;
use std::io::Write;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

/// Runs commands inside node containers
pub struct DockerRemote {
    docker: Docker,
}

impl DockerRemote {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    fn container<'a>(&self, instance: &'a Instance) -> &'a str {
        if instance.instance_id.is_empty() {
            &instance.name
        } else {
            &instance.instance_id
        }
    }

    async fn run(&self, instance: &Instance, request: &ExecRequest) -> RemoteResult<ExecOutput> {
        let container = self.container(instance);
        let exec_config = CreateExecOptions {
            cmd: Some(exec_argv(request)),
            attach_stdin: Some(request.stdin.is_some()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let connect = request.timeouts.connect;
        let message = timeout(connect, self.docker.create_exec(container, exec_config))
            .await
            .map_err(|_| RemoteError::connect_timeout(connect))?
            .map_err(|e| RemoteError::Connect(e.to_string()))?;

        let started = timeout(
            connect,
            self.docker
                .start_exec(&message.id, Some(StartExecOptions::default())),
        )
        .await
        .map_err(|_| RemoteError::connect_timeout(connect))?
        .map_err(|e| RemoteError::Connect(e.to_string()))?;

        let mut result = ExecOutput::default();
        match started {
            StartExecResults::Attached { mut output, mut input } => {
                if let Some(stdin) = &request.stdin {
                    input.write_all(stdin).await?;
                    input.shutdown().await?;
                }
                drop(input);

                let collect = async {
                    while let Some(msg) = output.next().await {
                        match msg.map_err(|e| RemoteError::Transfer(e.to_string()))? {
                            LogOutput::StdOut { message } | LogOutput::Console { message } => {
                                if request.interactive {
                                    let mut stdout = std::io::stdout();
                                    stdout.write_all(&message)?;
                                    stdout.flush()?;
                                } else {
                                    result.stdout.extend_from_slice(&message);
                                }
                            }
                            LogOutput::StdErr { message } => {
                                if request.interactive {
                                    std::io::stderr().write_all(&message)?;
                                } else {
                                    result.stderr.extend_from_slice(&message);
                                }
                            }
                            LogOutput::StdIn { .. } => {}
                        }
                    }
                    Ok::<(), RemoteError>(())
                };

                match request.timeouts.session {
                    Some(limit) => timeout(limit, collect)
                        .await
                        .map_err(|_| RemoteError::session_timeout(limit))??,
                    None => collect.await?,
                }
            }
            StartExecResults::Detached => {}
        }

        let inspect = self
            .docker
            .inspect_exec(&message.id)
            .await
            .map_err(|e| RemoteError::Connect(e.to_string()))?;
        result.exit_code = exit_code(inspect.exit_code, inspect.running)?;
        Ok(result)
    }
}

#[async_trait]
impl RemoteAction for DockerRemote {
    fn name(&self) -> &str {
        "docker"
    }

    async fn exec(&self, instance: &Instance, request: &ExecRequest) -> RemoteResult<ExecOutput> {
        tracing::debug!(
            container = self.container(instance),
            command = %request.command_line(),
            "docker exec"
        );
        self.run(instance, request).await
    }

    async fn upload(
        &self,
        instance: &Instance,
        source: &Path,
        dest: &str,
        permissions: u32,
        timeouts: Timeouts,
    ) -> RemoteResult<()> {
        let content = tokio::fs::read(source).await?;
        let request = ExecRequest::shell(upload_script(dest, permissions))
            .with_stdin(content)
            .with_timeouts(timeouts);
        self.run(instance, &request)
            .await?
            .check()
            .map_err(|e| RemoteError::Transfer(format!("{} -> {}: {}", source.display(), dest, e)))?;
        Ok(())
    }

    async fn download(
        &self,
        instance: &Instance,
        source: &str,
        dest: &Path,
        timeouts: Timeouts,
    ) -> RemoteResult<()> {
        let request =
            ExecRequest::new(["cat".to_string(), source.to_string()]).with_timeouts(timeouts);
        let output = self
            .run(instance, &request)
            .await?
            .check()
            .map_err(|e| RemoteError::Transfer(format!("{}: {}", source, e)))?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &output.stdout).await?;
        Ok(())
    }
}

/// argv of the exec; a one-element command runs through `/bin/sh -c`
pub fn exec_argv(request: &ExecRequest) -> Vec<String> {
    match request.script() {
        Some(script) => vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()],
        None => request.command.clone(),
    }
}

/// Exit code of a finished exec
fn exit_code(code: Option<i64>, running: Option<bool>) -> RemoteResult<i64> {
    match code {
        Some(code) if running != Some(true) => Ok(code),
        _ => Err(RemoteError::Transfer(
            "exec finished without an exit code".to_string(),
        )),
    }
}

/// Write stdin to `dest`, creating its directory, then set the mode
pub fn upload_script(dest: &str, permissions: u32) -> String {
    let dest = shell_quote(dest);
    format!(
        "mkdir -p \"$(dirname {dest})\" && cat > {dest} && chmod {mode:o} {dest}",
        dest = dest,
        mode = permissions
    )
}

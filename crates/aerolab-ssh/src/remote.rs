//! Remote actions over ssh / scp

use crate::command::{classify_ssh_failure, run_process};
use aerolab_fleet::{
    ExecOutput, ExecRequest, RemoteAction, RemoteError, RemoteResult, Timeouts,
};
use aerolab_inventory::Instance;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Connection settings shared by every node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshConfig {
    pub user: String,
    /// One private key per cluster, named after the cluster
    pub key_dir: PathBuf,
    pub port: u16,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            user: "root".to_string(),
            key_dir: PathBuf::from("keys"),
            port: 22,
        }
    }
}

/// Remote action client for aws/gcp instances
pub struct SshRemote {
    config: SshConfig,
}

impl SshRemote {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    pub fn key_path(&self, instance: &Instance) -> PathBuf {
        self.config.key_dir.join(&instance.cluster_name)
    }

    fn host<'a>(&self, instance: &'a Instance) -> RemoteResult<&'a str> {
        let ip = instance.ip.routable();
        if ip.is_empty() {
            Err(RemoteError::Connect(format!(
                "{} has no IP address",
                instance.name
            )))
        } else {
            Ok(ip)
        }
    }

    fn common_options(&self, instance: &Instance, timeouts: Timeouts) -> Vec<String> {
        vec![
            "-o".to_string(),
            format!("ConnectTimeout={}", timeouts.connect.as_secs().max(1)),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-i".to_string(),
            self.key_path(instance).display().to_string(),
        ]
    }

    /// Arguments of `ssh` running `request` on `instance`
    pub fn ssh_args(&self, instance: &Instance, request: &ExecRequest) -> RemoteResult<Vec<String>> {
        let host = self.host(instance)?;
        let mut args = self.common_options(instance, request.timeouts);
        args.push("-p".to_string());
        args.push(self.config.port.to_string());
        if request.interactive {
            args.push("-t".to_string());
        }
        args.push(format!("{}@{}", self.config.user, host));
        args.push("--".to_string());
        // the remote shell parses the command string
        args.push(match request.script() {
            Some(script) => script.to_string(),
            None => request.command_line(),
        });
        Ok(args)
    }

    /// Arguments of `scp`; `remote_to_local` picks the copy direction
    ///
    /// The remote path is passed unquoted in both directions, as SFTP mode
    /// takes it literally.
    pub fn scp_args(
        &self,
        instance: &Instance,
        local: &Path,
        remote: &str,
        remote_to_local: bool,
        timeouts: Timeouts,
    ) -> RemoteResult<Vec<String>> {
        let host = self.host(instance)?;
        let mut args = self.common_options(instance, timeouts);
        args.push("-P".to_string());
        args.push(self.config.port.to_string());
        args.push("-q".to_string());
        let remote = format!("{}@{}:{}", self.config.user, host, remote);
        let local = local.display().to_string();
        if remote_to_local {
            args.push(remote);
            args.push(local);
        } else {
            args.push(local);
            args.push(remote);
        }
        Ok(args)
    }
}

#[async_trait]
impl RemoteAction for SshRemote {
    fn name(&self) -> &str {
        "ssh"
    }

    async fn exec(&self, instance: &Instance, request: &ExecRequest) -> RemoteResult<ExecOutput> {
        let args = self.ssh_args(instance, request)?;
        let output = run_process(
            "ssh",
            &args,
            request.stdin.as_deref(),
            request.interactive,
            request.timeouts,
        )
        .await?;
        classify_ssh_failure(output, request.timeouts)
    }

    async fn upload(
        &self,
        instance: &Instance,
        source: &Path,
        dest: &str,
        permissions: u32,
        timeouts: Timeouts,
    ) -> RemoteResult<()> {
        let args = self.scp_args(instance, source, dest, false, timeouts)?;
        run_process("scp", &args, None, false, timeouts)
            .await?
            .check()
            .map_err(|e| RemoteError::Transfer(format!("{} -> {}: {}", source.display(), dest, e)))?;

        let chmod = ExecRequest::new([
            "chmod".to_string(),
            format!("{:o}", permissions),
            dest.to_string(),
        ])
        .with_timeouts(timeouts);
        self.exec(instance, &chmod).await?.check()?;
        Ok(())
    }

    async fn download(
        &self,
        instance: &Instance,
        source: &str,
        dest: &Path,
        timeouts: Timeouts,
    ) -> RemoteResult<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let args = self.scp_args(instance, dest, source, true, timeouts)?;
        run_process("scp", &args, None, false, timeouts)
            .await?
            .check()
            .map_err(|e| RemoteError::Transfer(format!("{}: {}", source, e)))?;
        Ok(())
    }
}

use super::files;
use crate::utils;
use aerolab_fleet::{ExecContext, ExecRequest, RemoteError, StateGate};
use colored::Colorize;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_PATH: &str = "/var/log/aerospike.log";

const JOURNAL_FILE: &str = "aerospike.journald.log";

/// Collect the Aerospike log of every selected node into `<dest>/<cluster>-<node>/`
pub async fn get(
    ctx: &ExecContext,
    names: &str,
    nodes: &str,
    path: &str,
    journal: bool,
    dest: &Path,
) -> anyhow::Result<()> {
    if journal {
        return get_journal(ctx, names, nodes, dest).await;
    }
    let file_name = files::remote_file_name(path.trim())?;
    files::fetch(ctx, names, nodes, path.trim(), dest, file_name).await
}

/// Capture `journalctl -u aerospike` instead of a log file
async fn get_journal(
    ctx: &ExecContext,
    names: &str,
    nodes: &str,
    dest: &Path,
) -> anyhow::Result<()> {
    let (targets, selector) = utils::parse_target(names, nodes)?;

    println!("{}", "Reading aerospike journal...".blue());
    let request = ExecRequest::new(["journalctl", "-u", "aerospike", "--no-pager"])
        .with_timeouts(ctx.options.timeouts);
    let dest = dest.to_path_buf();
    let report = ctx
        .run_on_targets(
            &targets,
            &selector,
            StateGate::Running,
            move |remote, instance| {
                let request = request.clone();
                let local = files::node_dir(&dest, &instance).join(JOURNAL_FILE);
                async move {
                    let output = remote.exec(&instance, &request).await?.check()?;
                    if let Some(parent) = local.parent() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                    tokio::fs::write(&local, &output.stdout).await?;
                    Ok::<_, RemoteError>(local)
                }
            },
        )
        .await?;

    utils::finish(report, |identity, local: PathBuf| {
        println!("  {} {} → {}", "✓".green(), identity, local.display());
    })?;
    Ok(())
}

use crate::utils;
use aerolab_fleet::{ExecContext, FleetError, StateGate};
use aerolab_inventory::Instance;
use colored::Colorize;
use std::path::{Path, PathBuf};

pub async fn upload(
    ctx: &ExecContext,
    names: &str,
    nodes: &str,
    source: &Path,
    dest: &str,
    mode: &str,
) -> anyhow::Result<()> {
    let (targets, selector) = utils::parse_target(names, nodes)?;
    let permissions = parse_mode(mode)?;
    if !source.is_file() {
        return Err(FleetError::Validation(format!("{} is not a file", source.display())).into());
    }

    println!(
        "{}",
        format!("Uploading {} to {}...", source.display(), dest).blue()
    );
    let source = source.to_path_buf();
    let dest = dest.to_string();
    let timeouts = ctx.options.timeouts;
    let report = ctx
        .run_on_targets(
            &targets,
            &selector,
            StateGate::Running,
            move |remote, instance| {
                let source = source.clone();
                let dest = dest.clone();
                async move {
                    remote
                        .upload(&instance, &source, &dest, permissions, timeouts)
                        .await
                }
            },
        )
        .await?;

    let uploaded = utils::finish(report, |identity, ()| {
        println!("  {} {}", "✓".green(), identity);
    })?;
    if uploaded > 0 {
        println!();
        println!("{}", format!("✓ Uploaded to {} node(s)", uploaded).green().bold());
    }
    Ok(())
}

pub async fn download(
    ctx: &ExecContext,
    names: &str,
    nodes: &str,
    source: &str,
    dest: &Path,
) -> anyhow::Result<()> {
    let file_name = remote_file_name(source)?;
    fetch(ctx, names, nodes, source, dest, file_name).await
}

/// Download `source` from every node into `<dest>/<cluster>-<node>/<file_name>`
pub async fn fetch(
    ctx: &ExecContext,
    names: &str,
    nodes: &str,
    source: &str,
    dest: &Path,
    file_name: String,
) -> anyhow::Result<()> {
    let (targets, selector) = utils::parse_target(names, nodes)?;

    println!("{}", format!("Downloading {}...", source).blue());
    let source = source.to_string();
    let dest = dest.to_path_buf();
    let timeouts = ctx.options.timeouts;
    let report = ctx
        .run_on_targets(
            &targets,
            &selector,
            StateGate::Running,
            move |remote, instance| {
                let source = source.clone();
                let local = node_dir(&dest, &instance).join(&file_name);
                async move {
                    remote
                        .download(&instance, &source, &local, timeouts)
                        .await
                        .map(|()| local)
                }
            },
        )
        .await?;

    let downloaded = utils::finish(report, |identity, local: PathBuf| {
        println!("  {} {} → {}", "✓".green(), identity, local.display());
    })?;
    if downloaded > 0 {
        println!();
        println!(
            "{}",
            format!("✓ Downloaded from {} node(s)", downloaded).green().bold()
        );
    }
    Ok(())
}

/// Per-node download directory
pub fn node_dir(dest: &Path, instance: &Instance) -> PathBuf {
    dest.join(format!("{}-{}", instance.cluster_name, instance.node_no))
}

/// Last path component of a remote path
pub fn remote_file_name(source: &str) -> Result<String, FleetError> {
    match source.trim_end().rsplit('/').next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => Ok(name.to_string()),
        _ => Err(FleetError::Validation(format!(
            "'{}' does not name a file",
            source
        ))),
    }
}

/// Octal file mode such as `644` or `0755`
pub fn parse_mode(mode: &str) -> Result<u32, FleetError> {
    u32::from_str_radix(mode.trim(), 8)
        .ok()
        .filter(|m| *m <= 0o7777)
        .ok_or_else(|| {
            FleetError::Validation(format!(
                "invalid file mode '{}', expected octal such as 644",
                mode
            ))
        })
}

use crate::utils;
use aerolab_fleet::hosts::{apply_request, render_entries};
use aerolab_fleet::{ExecContext, FleetError, RemoteError, StateGate};
use aerolab_inventory::{
    Instance, Instances, Inventory, InventoryError, NodeSelector, expand_target_list,
};
use colored::Colorize;

pub fn list(inventory: &Inventory, names: Option<&str>, all: bool, json: bool) -> anyhow::Result<()> {
    let mut instances = if all {
        inventory.instances()
    } else {
        inventory.instances().live()
    };

    if let Some(names) = names {
        let targets = expand_target_list(names);
        require_clusters(&instances, &targets)?;
        instances = instances.with_cluster_name(&targets);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&instances.describe())?);
        return Ok(());
    }

    print_instances(&instances.describe());
    Ok(())
}

/// Print `/etc/hosts` entries for the clusters, or write them on every running node
pub async fn hosts(ctx: &ExecContext, names: &str, apply: bool) -> anyhow::Result<()> {
    let (targets, _) = utils::parse_target(names, "")?;
    let live = ctx.inventory.instances().live();
    require_clusters(&live, &targets)?;

    let entries = render_entries(&live.with_cluster_name(&targets));
    if !apply {
        for line in &entries {
            println!("{}", line);
        }
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", "No node addresses to write".yellow());
        return Ok(());
    }

    println!("{}", format!("Writing {} hosts entries...", entries.len()).blue());
    let request = apply_request(&entries, ctx.options.timeouts);

    let report = ctx
        .run_on_targets(
            &targets,
            &NodeSelector::All,
            StateGate::Running,
            move |remote, instance| {
                let request = request.clone();
                async move {
                    remote.exec(&instance, &request).await?.check()?;
                    Ok::<_, RemoteError>(())
                }
            },
        )
        .await?;

    let updated = utils::finish(report, |identity, ()| {
        println!("  {} {}", "✓".green(), identity);
    })?;
    if updated > 0 {
        println!();
        println!("{}", format!("✓ Updated /etc/hosts on {} node(s)", updated).green().bold());
    }
    Ok(())
}

/// Every named cluster must have at least one instance in `instances`
fn require_clusters(instances: &Instances, targets: &[String]) -> Result<(), FleetError> {
    for target in targets {
        if instances.with_cluster_name([target]).is_empty() {
            return Err(InventoryError::ClusterNotFound(target.clone()).into());
        }
    }
    Ok(())
}

pub fn print_instances(instances: &[Instance]) {
    if instances.is_empty() {
        println!("{}", "No instances".dimmed());
        return;
    }

    let mut rows: Vec<&Instance> = instances.iter().collect();
    rows.sort_by(|a, b| {
        (a.cluster_name.as_str(), a.node_no).cmp(&(b.cluster_name.as_str(), b.node_no))
    });

    println!(
        "{}",
        format!(
            "{:<20} {:>4} {:<12} {:<15} {:<15} {:<8} {:<15} {:<20}",
            "CLUSTER", "NODE", "STATE", "PRIVATE IP", "PUBLIC IP", "BACKEND", "OWNER", "EXPIRES"
        )
        .bold()
    );
    println!("{}", "─".repeat(115).dimmed());

    for instance in rows {
        let expires = instance
            .expires
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:<20} {:>4} {} {:<15} {:<15} {:<8} {:<15} {:<20}",
            instance.cluster_name,
            instance.node_no,
            utils::instance_state_cell(instance.state, 12),
            utils::or_dash(&instance.ip.private),
            utils::or_dash(&instance.ip.public),
            instance.backend_type.to_string(),
            utils::or_dash(&instance.owner),
            utils::or_dash(&expires),
        );
    }
}

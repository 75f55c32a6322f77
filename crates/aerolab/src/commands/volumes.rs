use crate::utils;
use aerolab_inventory::{Inventory, Volume};
use colored::Colorize;

pub fn list(inventory: &Inventory, all: bool, json: bool) -> anyhow::Result<()> {
    let volumes = if all {
        inventory.volumes()
    } else {
        inventory.volumes().live()
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&volumes.describe())?);
        return Ok(());
    }

    print_volumes(&volumes.describe());
    Ok(())
}

pub fn print_volumes(volumes: &[Volume]) {
    if volumes.is_empty() {
        println!("{}", "No volumes".dimmed());
        return;
    }

    let mut rows: Vec<&Volume> = volumes.iter().collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));

    println!(
        "{}",
        format!(
            "{:<30} {:<10} {:<12} {:>9} {:<8} {:<15} {:<20}",
            "NAME", "STATE", "TYPE", "SIZE GiB", "BACKEND", "OWNER", "ATTACHED TO"
        )
        .bold()
    );
    println!("{}", "─".repeat(110).dimmed());

    for volume in rows {
        let attached = volume.attached_to.join(",");
        println!(
            "{:<30} {} {:<12} {:>9.1} {:<8} {:<15} {:<20}",
            volume.name,
            utils::volume_state_cell(volume.state, 10),
            volume.volume_type.to_string(),
            volume.size_gib(),
            volume.backend_type.to_string(),
            utils::or_dash(&volume.owner),
            utils::or_dash(&attached),
        );
    }
}

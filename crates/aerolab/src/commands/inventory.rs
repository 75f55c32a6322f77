use super::{cluster, volumes};
use aerolab_inventory::Inventory;

pub fn list(inventory: &Inventory, all: bool, json: bool) -> anyhow::Result<()> {
    let (instances, volume_view) = if all {
        (inventory.instances(), inventory.volumes())
    } else {
        (inventory.instances().live(), inventory.volumes().live())
    };

    if json {
        let doc = serde_json::json!({
            "taken_at": inventory.taken_at,
            "instances": instances.describe(),
            "volumes": volume_view.describe(),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    cluster::print_instances(&instances.describe());
    println!();
    volumes::print_volumes(&volume_view.describe());
    Ok(())
}

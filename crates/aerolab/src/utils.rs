use aerolab_fleet::{FleetError, MultiTargetReport};
use aerolab_inventory::{InstanceState, NodeSelector, VolumeState, expand_target_list};
use colored::{ColoredString, Colorize};

/// Parse `-n` and `-l` into target clusters and a node selector
pub fn parse_target(names: &str, nodes: &str) -> Result<(Vec<String>, NodeSelector), FleetError> {
    let targets = expand_target_list(names);
    if targets.is_empty() {
        return Err(FleetError::Validation(
            "no cluster names given, use -n".to_string(),
        ));
    }
    let selector = NodeSelector::parse(nodes)?;
    Ok((targets, selector))
}

/// Split a fan-out report, printing a notice when nothing was acted on
///
/// Returns the successful values; per-node failures become one joined error
/// after `on_success` has seen every value.
pub fn finish<T>(
    report: MultiTargetReport<T>,
    mut on_success: impl FnMut(&str, T),
) -> anyhow::Result<usize> {
    if report.node_count() == 0 {
        println!("{}", "No nodes to act on".yellow());
        return Ok(0);
    }

    let (values, failed) = report.into_parts();
    let succeeded = values.len();
    for (identity, value) in values {
        on_success(&identity, value);
    }

    match failed {
        None => Ok(succeeded),
        Some(errors) => {
            println!(
                "{} {} node(s) succeeded, {} failed",
                "!".yellow().bold(),
                succeeded,
                errors.len()
            );
            Err(FleetError::PartialFailure(errors).into())
        }
    }
}

/// State padded to `width`, coloured after padding so columns stay aligned
pub fn instance_state_cell(state: InstanceState, width: usize) -> ColoredString {
    let text = format!("{:<width$}", state.to_string());
    match state {
        InstanceState::Running => text.green(),
        InstanceState::Pending | InstanceState::Stopping | InstanceState::Terminating => {
            text.yellow()
        }
        InstanceState::Stopped | InstanceState::Terminated => text.dimmed(),
        InstanceState::Fail | InstanceState::Unknown => text.red(),
    }
}

pub fn volume_state_cell(state: VolumeState, width: usize) -> ColoredString {
    let text = format!("{:<width$}", state.to_string());
    match state {
        VolumeState::InUse => text.green(),
        VolumeState::Available => text.cyan(),
        VolumeState::Creating | VolumeState::Deleting => text.yellow(),
        VolumeState::Deleted => text.dimmed(),
        VolumeState::Fail | VolumeState::Unknown => text.red(),
    }
}

/// `-` for empty cells
pub fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

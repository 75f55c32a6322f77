use crate::utils;
use aerolab_fleet::{
    ExecContext, ExecOutput, ExecRequest, FleetError, RemoteError, StateGate, Timeouts,
    resolve_nodes,
};
use aerolab_inventory::NodeSelector;
use colored::Colorize;

/// Shell started when no command is given
const DEFAULT_SHELL: &str = "/bin/bash";

pub async fn handle(
    ctx: &ExecContext,
    names: &str,
    nodes: &str,
    interactive: bool,
    command: Vec<String>,
) -> anyhow::Result<()> {
    let (targets, selector) = utils::parse_target(names, nodes)?;

    if interactive || command.is_empty() {
        let command = if command.is_empty() {
            vec![DEFAULT_SHELL.to_string()]
        } else {
            command
        };
        return attach_terminal(ctx, &targets, &selector, command).await;
    }

    tracing::info!(command = %command.join(" "), "Running command");
    let request = ExecRequest::new(command).with_timeouts(ctx.options.timeouts);
    let report = ctx
        .run_on_targets(
            &targets,
            &selector,
            StateGate::Running,
            move |remote, instance| {
                let request = request.clone();
                async move { remote.exec(&instance, &request).await?.check() }
            },
        )
        .await?;

    let with_headers = report.node_count() > 1;
    let mut outputs: Vec<(String, ExecOutput)> = Vec::new();
    let result = utils::finish(report, |identity, output| {
        outputs.push((identity.to_string(), output));
    });

    outputs.sort_by(|a, b| a.0.cmp(&b.0));
    for (identity, output) in &outputs {
        print_output(identity, output, with_headers);
    }
    result.map(|_| ())
}

/// Attach the local terminal to one node
async fn attach_terminal(
    ctx: &ExecContext,
    targets: &[String],
    selector: &NodeSelector,
    command: Vec<String>,
) -> anyhow::Result<()> {
    let [target] = targets else {
        return Err(FleetError::Validation(
            "an interactive session needs exactly one cluster".to_string(),
        )
        .into());
    };

    let resolved = resolve_nodes(
        &ctx.inventory.instances(),
        target,
        selector,
        StateGate::Running,
    )?;
    let instance = match &resolved.nodes[..] {
        [] => {
            println!("{}", "No nodes to act on".yellow());
            return Ok(());
        }
        [instance] => instance,
        nodes => {
            return Err(FleetError::Validation(format!(
                "an interactive session needs exactly one node, {} selected; use -l",
                nodes.len()
            ))
            .into());
        }
    };

    // interactive sessions only bound the connect phase
    let timeouts = Timeouts {
        session: None,
        ..ctx.options.timeouts
    };
    let request = ExecRequest::new(command)
        .with_timeouts(timeouts)
        .interactive(true);
    tracing::debug!(node = %instance.node_id(), "Attaching terminal");

    let output = ctx
        .remote
        .exec(instance, &request)
        .await
        .map_err(FleetError::from)?;
    if !output.success() {
        let err = RemoteError::exit_status(output.exit_code, &output.stderr);
        return Err(FleetError::from(err).into());
    }
    Ok(())
}

fn print_output(identity: &str, output: &ExecOutput, with_header: bool) {
    if with_header {
        println!("{}", format!("=== {} ===", identity).bold());
    }
    print!("{}", output.stdout_lossy());
    if !output.stderr.is_empty() {
        eprint!("{}", String::from_utf8_lossy(&output.stderr));
    }
}

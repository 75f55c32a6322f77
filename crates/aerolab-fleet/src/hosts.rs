//! `/etc/hosts` entries for cluster nodes

use crate::remote::{ExecRequest, Timeouts};
use aerolab_inventory::Instances;

/// Marker appended to every managed line
pub const HOSTS_MARKER: &str = "# aerolab-managed";

/// Hostname of a node, `<cluster>-<node>` limited to `[A-Za-z0-9-]`
pub fn node_hostname(cluster: &str, node_no: u32) -> String {
    let raw = format!("{}-{}", cluster, node_no);
    let mut name = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '-' };
        if c == '-' && name.ends_with('-') {
            continue;
        }
        name.push(c);
    }
    name.trim_matches('-').to_string()
}

/// One line per address of every live node; public entries follow private ones
pub fn render_entries(instances: &Instances) -> Vec<String> {
    let mut private = Vec::new();
    let mut public = Vec::new();

    let live = instances.live();
    let mut nodes: Vec<_> = live.iter().collect();
    nodes.sort_by(|a, b| {
        (a.cluster_name.as_str(), a.node_no).cmp(&(b.cluster_name.as_str(), b.node_no))
    });

    for instance in nodes {
        let hostname = node_hostname(&instance.cluster_name, instance.node_no);
        if !instance.ip.private.is_empty() {
            private.push(entry(&instance.ip.private, &hostname));
        }
        if !instance.ip.public.is_empty() {
            public.push(entry(&instance.ip.public, &format!("{}-pub", hostname)));
        }
    }

    private.extend(public);
    private
}

fn entry(ip: &str, name: &str) -> String {
    format!("{:<15} {:<30} {}", ip, name, HOSTS_MARKER)
}

/// Shell script that replaces managed lines in `/etc/hosts` with stdin
///
/// Exits non-zero when the file cannot be read or written.
pub fn apply_script() -> String {
    hosts_script("/etc/hosts")
}

fn hosts_script(hosts: &str) -> String {
    // grep exits 1 when every line was managed
    format!(
        "tmp=$(mktemp) || exit 1; \
         grep -v '{marker}' {hosts} > \"$tmp\"; rc=$?; \
         [ $rc -le 1 ] && cat >> \"$tmp\" && cat \"$tmp\" > {hosts}; rc=$?; \
         rm -f \"$tmp\"; exit $rc",
        marker = HOSTS_MARKER,
        hosts = hosts
    )
}

/// Request writing `entries` into `/etc/hosts` of a node
pub fn apply_request(entries: &[String], timeouts: Timeouts) -> ExecRequest {
    let mut content = entries.join("\n");
    content.push('\n');
    ExecRequest::shell(apply_script())
        .with_stdin(content)
        .with_timeouts(timeouts)
}

#![allow(deprecated)] // TODO: move cargo_bin to cargo_bin_cmd!

mod common;

use assert_cmd::Command;
use common::TestLab;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("aerolab").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("inventory"))
        .stdout(predicate::str::contains("cluster"))
        .stdout(predicate::str::contains("attach"))
        .stdout(predicate::str::contains("files"))
        .stdout(predicate::str::contains("logs"))
        .stdout(predicate::str::contains("volumes"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("aerolab").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("aerolab"));
}

#[test]
fn test_attach_help() {
    let mut cmd = Command::cargo_bin("aerolab").unwrap();
    cmd.arg("attach")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--name"))
        .stdout(predicate::str::contains("--nodes"))
        .stdout(predicate::str::contains("--parallel"));
}

#[test]
fn test_inventory_list_json_hides_terminated() {
    let lab = TestLab::new();
    let output = lab
        .cmd()
        .args(["inventory", "list", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let instances = doc["instances"].as_array().unwrap();
    assert_eq!(instances.len(), 6);
    assert!(instances.iter().all(|i| i["cluster_name"] != "old"));
    assert_eq!(doc["volumes"].as_array().unwrap().len(), 1);
}

#[test]
fn test_inventory_list_all_includes_terminated() {
    let lab = TestLab::new();
    let output = lab
        .cmd()
        .args(["inventory", "list", "--all", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["instances"].as_array().unwrap().len(), 7);
    assert_eq!(doc["volumes"].as_array().unwrap().len(), 2);
}

#[test]
fn test_cluster_list() {
    let lab = TestLab::new();
    lab.cmd()
        .args(["cluster", "list", "-n", "mydc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("172.17.0.3"))
        .stdout(predicate::str::contains("Running"))
        .stdout(predicate::str::contains("cold").not());
}

#[test]
fn test_cluster_list_unknown_cluster() {
    let lab = TestLab::new();
    lab.cmd()
        .args(["cluster", "list", "-n", "nosuch"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Cluster nosuch not found"));
}

#[test]
fn test_cluster_hosts_prints_entries() {
    let lab = TestLab::new();
    lab.cmd()
        .args(["cluster", "hosts", "-n", "mydc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("172.17.0.2"))
        .stdout(predicate::str::contains("mydc-1"))
        .stdout(predicate::str::contains("# aerolab-managed"));
}

#[test]
fn test_attach_stopped_cluster_is_a_noop() {
    let lab = TestLab::new();
    lab.cmd()
        .args(["attach", "-n", "cold", "--", "asinfo", "-v", "build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No nodes to act on"));
}

#[test]
fn test_attach_missing_node_names_it() {
    let lab = TestLab::new();
    lab.cmd()
        .args(["attach", "-n", "mydc", "-l", "4", "--", "ls"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"))
        .stderr(predicate::str::contains("4"));
}

#[test]
fn test_attach_invalid_selector() {
    let lab = TestLab::new();
    lab.cmd()
        .args(["attach", "-n", "mydc", "-l", "abc", "--", "ls"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("abc"));
}

#[test]
fn test_attach_reversed_range() {
    let lab = TestLab::new();
    lab.cmd()
        .args(["attach", "-n", "mydc", "-l", "3-1", "--", "ls"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("3-1"));
}

#[test]
fn test_attach_stops_at_first_missing_cluster() {
    let lab = TestLab::new();
    lab.cmd()
        .args(["attach", "-n", "nosuch,mydc", "-l", "4", "--", "ls"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cluster nosuch not found"))
        .stderr(predicate::str::contains("mydc not found").not());
}

#[test]
fn test_interactive_attach_needs_one_node() {
    let lab = TestLab::new();
    lab.cmd()
        .args(["attach", "-n", "mydc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exactly one node"));
}

#[test]
fn test_upload_missing_source() {
    let lab = TestLab::new();
    let missing = lab.home.path().join("missing.conf");
    lab.cmd()
        .args(["files", "upload", "-n", "mydc"])
        .arg(&missing)
        .arg("/etc/aerospike/aerospike.conf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a file"));
}

#[test]
fn test_upload_invalid_mode() {
    let lab = TestLab::new();
    lab.cmd()
        .args(["files", "upload", "-n", "mydc", "--mode", "rwx"])
        .arg(lab.inventory_path())
        .arg("/tmp/inventory.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid file mode"));
}

#[test]
fn test_logs_get_stopped_cluster_is_a_noop() {
    let lab = TestLab::new();
    let dest = lab.home.path().join("logs");
    lab.cmd()
        .args(["logs", "get", "-n", "cold", "-d"])
        .arg(&dest)
        .assert()
        .success()
        .stdout(predicate::str::contains("No nodes to act on"));
}

#[test]
fn test_volumes_list() {
    let lab = TestLab::new();
    lab.cmd()
        .args(["volumes", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mydc-data"))
        .stdout(predicate::str::contains("scratch-gone").not());

    lab.cmd()
        .args(["volumes", "list", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scratch-gone"));
}

#[test]
fn test_missing_inventory_file() {
    let lab = TestLab::new();
    let mut cmd = Command::cargo_bin("aerolab").unwrap();
    cmd.env("AEROLAB_HOME", lab.home.path())
        .args(["--backend", "file", "--inventory"])
        .arg(lab.home.path().join("absent.json"))
        .args(["cluster", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_defaults_file_selects_backend() {
    let lab = TestLab::new();
    std::fs::write(
        lab.home.path().join("defaults.yaml"),
        "backend: file\nparallel_threads: 2\n",
    )
    .unwrap();

    // inventory falls back to <config dir>/inventory.json
    let mut cmd = Command::cargo_bin("aerolab").unwrap();
    cmd.env("AEROLAB_HOME", lab.home.path())
        .env_remove("AEROLAB_BACKEND")
        .env_remove("AEROLAB_INVENTORY")
        .args(["cluster", "list", "-n", "mydc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("172.17.0.4"));
}

#[test]
fn test_invalid_defaults_file() {
    let lab = TestLab::new();
    std::fs::write(lab.home.path().join("defaults.yaml"), "parallel_threads: 0\n").unwrap();
    lab.cmd()
        .args(["cluster", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parallel_threads"));
}

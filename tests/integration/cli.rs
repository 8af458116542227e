//! Tests of the `bundleprep` binary.

use assert_cmd::Command;
use bundleprep::test_utils::{BundleFixture, ClusterFixture};
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

/// The binary with user config and colors isolated from the host.
fn bundleprep(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bundleprep").unwrap();
    cmd.env("HOME", home.path())
        .env("BUNDLEPREP_CONFIG", home.path().join("absent.toml"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_render_json_output() {
    let dir = TempDir::new().unwrap();
    let bundle = BundleFixture::typed().write_to(dir.path()).unwrap();
    let cluster = ClusterFixture::basic().write_to(dir.path()).unwrap();

    let output = bundleprep(&dir)
        .args(["render", "--format", "json", "--bundle"])
        .arg(&bundle)
        .arg("--cluster")
        .arg(&cluster)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let values: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(values["replicaCount"], json!(2));
    assert_eq!(values["ratio"], json!(0.544));
    assert_eq!(values["monitoring"], json!(true));
    assert_eq!(values["storageClass"], Value::Null);
    assert_eq!(values["env"], json!("dev"));
}

#[test]
fn test_render_yaml_output_is_default() {
    let dir = TempDir::new().unwrap();
    let bundle = BundleFixture::with_values("name: \"{{ ClusterName }}\"", false)
        .write_to(dir.path())
        .unwrap();
    let cluster = ClusterFixture::minimal("edge-1").write_to(dir.path()).unwrap();

    bundleprep(&dir)
        .arg("render")
        .arg("--bundle")
        .arg(&bundle)
        .arg("--cluster")
        .arg(&cluster)
        .assert()
        .success()
        .stdout("name: edge-1\n");
}

#[test]
fn test_render_failure_reports_and_exits_1() {
    let dir = TempDir::new().unwrap();
    let bundle = BundleFixture::with_values("replicas: \"{{ Values.replicaCount | asint }}\"", false)
        .write_to(dir.path())
        .unwrap();
    let cluster = ClusterFixture::basic().write_to(dir.path()).unwrap();

    bundleprep(&dir)
        .arg("render")
        .arg("--bundle")
        .arg(&bundle)
        .arg("--cluster")
        .arg(&cluster)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("test-cluster"))
        .stderr(predicate::str::contains("Failing value: replicas"))
        .stderr(predicate::str::contains("Did you mean: asInt"));
}

#[test]
fn test_render_depth_failure() {
    let dir = TempDir::new().unwrap();
    let bundle = BundleFixture::nested(51).write_to(dir.path()).unwrap();
    let cluster = ClusterFixture::basic().write_to(dir.path()).unwrap();

    bundleprep(&dir)
        .arg("render")
        .arg("--bundle")
        .arg(&bundle)
        .arg("--cluster")
        .arg(&cluster)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("maximum recursion depth"));
}

#[test]
fn test_missing_file_suggestion() {
    let dir = TempDir::new().unwrap();

    bundleprep(&dir)
        .args(["render", "--bundle", "does-not-exist.yaml", "--cluster", "nope.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does-not-exist.yaml"))
        .stderr(predicate::str::contains("Check that the file exists"));
}

#[test]
fn test_labels_command() {
    let dir = TempDir::new().unwrap();
    let values = dir.path().join("values.yaml");
    let labels = dir.path().join("labels.yaml");
    std::fs::write(&values, "region: global.fleet.clusterLabels.region\nother: 1\n").unwrap();
    std::fs::write(&labels, "region: eu-west\n").unwrap();

    bundleprep(&dir)
        .arg("labels")
        .arg("--values")
        .arg(&values)
        .arg("--labels")
        .arg(&labels)
        .args(["--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"region\": \"eu-west\""))
        .stdout(predicate::str::contains("\"other\": 1"));
}

#[test]
fn test_wrap_command() {
    let dir = TempDir::new().unwrap();

    bundleprep(&dir)
        .args(["wrap", "--type", "float", "0.544"])
        .assert()
        .success()
        .stdout(predicate::str::contains("token: fleetYamlTplTypeConv:"))
        .stdout(predicate::str::contains(":float:0.544"))
        .stdout(predicate::str::contains("value: 0.544"));

    bundleprep(&dir)
        .args(["wrap", "--type", "int", "[1, 2]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot convert"));
}

#[test]
fn test_verbose_logs_go_to_stderr() {
    let dir = TempDir::new().unwrap();
    let bundle = BundleFixture::with_values("n: \"{{ ClusterName }}\"", false)
        .write_to(dir.path())
        .unwrap();
    let cluster = ClusterFixture::minimal("c1").write_to(dir.path()).unwrap();

    bundleprep(&dir)
        .arg("--verbose")
        .arg("render")
        .arg("--bundle")
        .arg(&bundle)
        .arg("--cluster")
        .arg(&cluster)
        .assert()
        .success()
        .stdout("n: c1\n")
        .stderr(predicate::str::contains("Preprocessing helm values for cluster 'c1'"));
}

#[test]
fn test_verbose_and_quiet_are_exclusive() {
    let dir = TempDir::new().unwrap();

    bundleprep(&dir)
        .args(["--verbose", "--quiet", "wrap", "--type", "int", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

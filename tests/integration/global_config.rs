//! Global config discovery and its effect on rendering.

use assert_cmd::Command;
use bundleprep::config::{GlobalConfig, OutputFormat};
use bundleprep::constants::CONFIG_PATH_ENV;
use bundleprep::test_utils::{BundleFixture, ClusterFixture};
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

#[tokio::test]
#[serial]
async fn test_env_var_selects_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "output_format = \"json\"\n").unwrap();

    let original = std::env::var_os(CONFIG_PATH_ENV);
    // SAFETY: serialized with every other test touching this variable.
    unsafe { std::env::set_var(CONFIG_PATH_ENV, &path) };
    let loaded = GlobalConfig::load_with_optional(None).await;
    match original {
        // SAFETY: as above.
        Some(value) => unsafe { std::env::set_var(CONFIG_PATH_ENV, value) },
        None => unsafe { std::env::remove_var(CONFIG_PATH_ENV) },
    }

    assert_eq!(loaded.unwrap().output_format, OutputFormat::Json);
}

#[tokio::test]
#[serial]
async fn test_explicit_path_wins_over_env_var() {
    let dir = TempDir::new().unwrap();
    let from_env = dir.path().join("env.toml");
    let explicit = dir.path().join("explicit.toml");
    std::fs::write(&from_env, "output_format = \"json\"\n").unwrap();
    std::fs::write(&explicit, "force_disable_preprocess = true\n").unwrap();

    let original = std::env::var_os(CONFIG_PATH_ENV);
    // SAFETY: serialized with every other test touching this variable.
    unsafe { std::env::set_var(CONFIG_PATH_ENV, &from_env) };
    let loaded = GlobalConfig::load_with_optional(Some(explicit)).await;
    match original {
        // SAFETY: as above.
        Some(value) => unsafe { std::env::set_var(CONFIG_PATH_ENV, value) },
        None => unsafe { std::env::remove_var(CONFIG_PATH_ENV) },
    }

    let loaded = loaded.unwrap();
    assert!(loaded.force_disable_preprocess);
    assert_eq!(loaded.output_format, OutputFormat::Yaml);
}

#[test]
fn test_config_flag_changes_render() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "output_format = \"json\"\nforce_disable_preprocess = true\n").unwrap();
    let bundle = BundleFixture::with_values(
        "name: \"{{ ClusterName }}\"\nenv: global.fleet.clusterLabels.envType",
        false,
    )
    .write_to(dir.path())
    .unwrap();
    let cluster = ClusterFixture::basic().write_to(dir.path()).unwrap();

    Command::cargo_bin("bundleprep")
        .unwrap()
        .env("HOME", dir.path())
        .env("NO_COLOR", "1")
        .arg("--config")
        .arg(&config)
        .arg("render")
        .arg("--bundle")
        .arg(&bundle)
        .arg("--cluster")
        .arg(&cluster)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"{{ ClusterName }}\""))
        .stdout(predicate::str::contains("\"env\": \"dev\""));
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "output_format = \"xml\"\n").unwrap();

    Command::cargo_bin("bundleprep")
        .unwrap()
        .env("NO_COLOR", "1")
        .arg("--config")
        .arg(&config)
        .args(["wrap", "--type", "int", "1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse global config"));
}

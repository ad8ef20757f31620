use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_config_path_command() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("tern")
        .env("TERN_HOME", dir.path())
        .env_remove("TERN_CONFIG")
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            dir.path().join("config.toml").display().to_string(),
        ));
}

#[test]
fn test_config_path_respects_flag() {
    let dir = tempdir().unwrap();
    let custom = dir.path().join("custom.toml");

    cargo_bin_cmd!("tern")
        .env("TERN_HOME", dir.path())
        .arg("config")
        .arg("path")
        .arg("--config")
        .arg(&custom)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_init_creates_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    assert!(!config_path.exists());

    cargo_bin_cmd!("tern")
        .env("TERN_HOME", dir.path())
        .env_remove("TERN_CONFIG")
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config at"));

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("model ="));
}

#[test]
fn test_config_init_fails_if_exists() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    fs::write(&config_path, "# existing config").unwrap();

    cargo_bin_cmd!("tern")
        .env("TERN_HOME", dir.path())
        .env_remove("TERN_CONFIG")
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_invalid_config_fails_to_start() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "max_tokens = \"lots\"").unwrap();

    cargo_bin_cmd!("tern")
        .env("TERN_HOME", dir.path())
        .env_remove("TERN_CONFIG")
        .write_stdin("hello")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}

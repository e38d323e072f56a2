//! Command-line surface of the binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn sessiondeck(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sessiondeck").expect("binary is built");
    cmd.arg("--data-dir").arg(data_dir.path());
    cmd
}

#[test]
fn test_print_config_writes_defaults_on_first_run() {
    let dir = TempDir::new().unwrap();

    sessiondeck(&dir)
        .arg("--print-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"executable\": \"claude\""))
        .stdout(predicate::str::contains("\"prefix\": \"C-a\""));

    assert!(dir.path().join("config.toml").exists());
    assert!(dir.path().join("logs").is_dir());
}

#[test]
fn test_config_file_and_flags_are_merged() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "executable = \"agent\"\n\n[status]\nstyle = \"plain\"\n",
    )
    .unwrap();

    sessiondeck(&dir)
        .args(["--print-config", "--executable", "other-agent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"executable\": \"other-agent\""))
        .stdout(predicate::str::contains("\"style\": \"plain\""));
}

#[test]
fn test_missing_cwd_fails() {
    let dir = TempDir::new().unwrap();

    sessiondeck(&dir)
        .arg("--cwd")
        .arg(dir.path().join("does-not-exist"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not accessible"));
}

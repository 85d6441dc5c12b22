// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Integration tests for the forknet CLI commands
//!
//! None of these reach the network: each run either stops at configuration
//! validation or never needs the forge.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// A forknet command isolated from the caller's environment
fn forknet(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("forknet").unwrap();
    cmd.env_remove("GITHUB_REPOSITORY")
        .env_remove("GITHUB_TOKEN")
        .env_remove("RUST_LOG")
        .env("HOME", config_dir.path())
        .env("XDG_CONFIG_HOME", config_dir.path())
        .env("NO_COLOR", "1");
    for (key, _) in std::env::vars() {
        if key.starts_with("FORKNET_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    forknet(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_scan_without_root_fails_before_network() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("web");

    forknet(&dir)
        .args(["scan", "--output"])
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no root repository configured"));

    assert!(!output.exists(), "nothing should be written");
}

#[test]
fn test_scan_with_malformed_root_fails() {
    let dir = TempDir::new().unwrap();

    forknet(&dir)
        .args(["scan", "--repo", "not-a-full-name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected OWNER/NAME"));
}

#[test]
fn test_scan_rejects_zero_depth() {
    let dir = TempDir::new().unwrap();

    forknet(&dir)
        .args(["scan", "--repo", "roeiba/forkMonkey", "--max-depth", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_depth"));
}

#[test]
fn test_config_shows_defaults() {
    let dir = TempDir::new().unwrap();

    forknet(&dir)
        .args(["config", "max_total"])
        .assert()
        .success()
        .stdout(predicate::str::diff("200\n"));
}

#[test]
fn test_config_reads_file_and_environment() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("custom.toml");
    fs::write(&file, "root_repo = \"roeiba/forkMonkey\"\nmax_depth = 2\n").unwrap();

    forknet(&dir)
        .env("FORKNET_MAX_DEPTH", "4")
        .arg("--config")
        .arg(&file)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"root_repo\": \"roeiba/forkMonkey\""))
        .stdout(predicate::str::contains("\"max_depth\": 4"));
}

#[test]
fn test_config_redacts_token() {
    let dir = TempDir::new().unwrap();

    forknet(&dir)
        .env("GITHUB_TOKEN", "ghp_very_secret")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("ghp_very_secret").not())
        .stdout(predicate::str::contains("********"));
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = TempDir::new().unwrap();

    forknet(&dir)
        .args(["config", "no_such_key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_completions_bash() {
    let dir = TempDir::new().unwrap();

    forknet(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("forknet"));
}

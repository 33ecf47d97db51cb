//! Integration tests for CLI structure and argument parsing

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn bootstrap() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("volttron-bootstrap"));
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_cli_no_args_shows_help() {
    // clap with arg_required_else_help shows help on stderr and exits 2
    bootstrap()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Bootstrap a VOLTTRON platform container"));
}

#[test]
fn test_cli_help_lists_commands() {
    bootstrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("version"));
}

#[test]
fn test_run_help_names_environment_bindings() {
    bootstrap()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PLATFORM_CONFIG"))
        .stdout(predicate::str::contains("VOLTTRON_VENV"))
        .stdout(predicate::str::contains("PLATFORM_READY_TIMEOUT"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    bootstrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("volttron-bootstrap"));
}

#[test]
fn test_version_command_shows_version() {
    bootstrap()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "volttron-bootstrap {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_unknown_subcommand_is_rejected() {
    bootstrap()
        .arg("reset")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

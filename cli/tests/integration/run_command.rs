//! Integration tests for `volttron-bootstrap run`
//!
//! The virtual environment is a temp directory whose tools are symlinks to
//! `true`/`false`, so nothing is actually installed.

#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "PLATFORM_CONFIG",
    "REINITIALIZE",
    "VOLTTRON_VENV",
    "VOLTTRON_HOME",
    "PIP_CACHE_DIR",
    "VOLTTRON_VERSION",
    "PLATFORM_CONFIG_DIR",
    "PLATFORM_READY_TIMEOUT",
    "BOOTSTRAP_PYTHON",
];

fn bootstrap() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("volttron-bootstrap"));
    cmd.env("NO_COLOR", "1");
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// A platform home and a virtual environment with an interpreter in place.
struct Container {
    root: TempDir,
}

impl Container {
    fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(root.path().join("venv/bin")).expect("venv");
        std::fs::create_dir_all(root.path().join("home")).expect("home");
        std::fs::write(root.path().join("venv/bin/python"), "").expect("python");
        Self { root }
    }

    fn venv(&self) -> PathBuf {
        self.root.path().join("venv")
    }

    fn home(&self) -> PathBuf {
        self.root.path().join("home")
    }

    fn mark(&self, name: &str) -> &Self {
        std::fs::write(self.home().join(name), "").expect("marker");
        self
    }

    fn document(&self, content: &str) -> PathBuf {
        let path = self.root.path().join("platform_config.yml");
        std::fs::write(&path, content).expect("document");
        path
    }

    #[cfg(unix)]
    fn link_tool(&self, name: &str, target: &Path) {
        std::os::unix::fs::symlink(target, self.venv().join("bin").join(name)).expect("symlink");
    }

    fn run(&self) -> Command {
        let mut cmd = bootstrap();
        cmd.arg("run")
            .env("VOLTTRON_VENV", self.venv())
            .env("VOLTTRON_HOME", self.home());
        cmd
    }
}

#[cfg(unix)]
fn system_tool(name: &str) -> PathBuf {
    ["/bin", "/usr/bin"]
        .iter()
        .map(|dir| Path::new(dir).join(name))
        .find(|p| p.exists())
        .expect("tool on system")
}

#[test]
fn test_run_without_venv_is_rejected() {
    bootstrap()
        .arg("run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid $VOLTTRON_VENV directory specified"));
}

#[test]
fn test_run_with_completion_marker_exits_zero_without_work() {
    let container = Container::new();
    container.mark("initialize_volttron").mark("initialized");
    let document = container.document("agents:\n  listener:\n    source: examples/ListenerAgent\n");

    container
        .run()
        .env("PLATFORM_CONFIG", &document)
        .assert()
        .success()
        .stdout(predicate::str::contains("already initialized"));

    assert!(!container.home().join("volttron.log").exists());
}

#[test]
fn test_run_with_unmounted_document_fails() {
    let container = Container::new();
    container.mark("initialize_volttron");

    container
        .run()
        .env("PLATFORM_CONFIG", container.root.path().join("missing.yml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Did you mount it properly?"));
}

#[cfg(unix)]
#[test]
fn test_run_passes_installer_exit_code_through() {
    let container = Container::new();
    container.link_tool("pip", &system_tool("false"));

    container
        .run()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("exited with code 1"));

    assert!(!container.home().join("initialize_volttron").exists());
}

#[cfg(unix)]
#[test]
fn test_run_records_platform_install_marker() {
    let container = Container::new();
    container.link_tool("pip", &system_tool("true"));
    // A missing document stops the run right after the platform install.
    container
        .run()
        .env("PLATFORM_CONFIG", container.root.path().join("missing.yml"))
        .assert()
        .code(1);

    let marker = std::fs::read_to_string(container.home().join("initialize_volttron")).expect("marker");
    assert_eq!(marker, "Initialized");
}

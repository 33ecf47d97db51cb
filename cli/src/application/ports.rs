//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`; never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::Result;

// ── Value Types ───────────────────────────────────────────────────────────────

/// Durable one-shot flags kept in the platform home directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// The platform package is installed in the virtual environment.
    PlatformInstalled,
    /// Every agent in the platform document was installed and configured.
    InstallCompleted,
}

/// Launch parameters for the platform process.
pub struct PlatformLaunch<'a> {
    /// Platform executable inside the virtual environment.
    pub program: &'a Path,
    pub args: &'a [String],
    /// Log file receiving every output line; truncated on launch.
    pub log_path: &'a Path,
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output, killing it after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program with inherited stdio and return only its exit status.
    ///
    /// Used for installer and control CLI calls whose output is passed
    /// straight through to the console.
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait: no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── State and Filesystem Ports ────────────────────────────────────────────────

/// Existence-only flags that survive container restarts.
pub trait MarkerStore {
    /// Whether the marker has been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker location cannot be inspected.
    fn is_set(&self, marker: Marker) -> Result<bool>;
    /// Write the marker, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker cannot be written.
    fn set(&self, marker: Marker) -> Result<()>;
}

/// Abstracts the local filesystem operations services need.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    /// # Errors
    /// Returns an error if the directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    /// # Errors
    /// Returns an error if the file cannot be written.
    fn write(&self, path: &Path, content: String) -> Result<()>;
    /// # Errors
    /// Returns an error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> Result<String>;
}

// ── Platform Process Ports ────────────────────────────────────────────────────

/// Starts the long-running platform process.
pub trait PlatformLauncher {
    type Process: PlatformProcess;

    /// Spawn the platform and start mirroring its output to the log and console.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be created or the process
    /// cannot be spawned.
    fn launch(&self, spec: &PlatformLaunch<'_>) -> Result<Self::Process>;
}

/// Handle to a running platform; its lifetime is the platform's lifetime.
#[allow(async_fn_in_trait)]
pub trait PlatformProcess {
    /// Non-blocking liveness check: `Some(status)` once the process has exited.
    ///
    /// # Errors
    ///
    /// Returns an error if the process status cannot be queried.
    fn try_wait(&mut self) -> Result<Option<ExitStatus>>;
    /// Block until the platform exits and its output is fully flushed.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting on the process or the output pump fails.
    async fn wait(self) -> Result<ExitStatus>;
}

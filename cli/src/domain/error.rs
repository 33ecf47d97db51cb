//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors raised while loading the platform document or the files it references.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PLATFORM_CONFIG file not found: {}. Did you mount it properly?", .0.display())]
    NotFound(PathBuf),

    #[error("cannot parse platform config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid platform config: {0}")]
    Invalid(#[from] serde_yaml::Error),

    #[error("duplicate {section} entry '{identity}' in platform config")]
    DuplicateIdentity {
        section: &'static str,
        identity: String,
    },

    #[error("missing config_store file for agent '{identity}': {}", path.display())]
    MissingConfigStoreFile { identity: String, path: PathBuf },
}

// ── Environment errors ────────────────────────────────────────────────────────

/// Errors raised while resolving bootstrap settings from the environment.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("Invalid ${0} directory specified")]
    MissingVariable(&'static str),

    #[error("cannot determine home directory; set $VOLTTRON_HOME")]
    NoHomeDirectory,
}

// ── External process errors ───────────────────────────────────────────────────

/// Failures of the installer, the control CLI or the platform executable.
#[derive(Debug, Error)]
pub enum ExternalProcessError {
    #[error("{program} exited with code {code}")]
    Failed { program: String, code: i32 },

    #[error("{program} was terminated by a signal")]
    Signaled { program: String },
}

impl ExternalProcessError {
    /// Exit code the bootstrap process should terminate with.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Failed { code, .. } => *code,
            Self::Signaled { .. } => 1,
        }
    }
}

// ── Readiness errors ──────────────────────────────────────────────────────────

/// Terminal failures of the platform readiness wait.
#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("platform did not report '{peer}' within {}s", elapsed.as_secs())]
    TimedOut { peer: &'static str, elapsed: Duration },

    #[error("platform exited before becoming ready (exit code {code:?}); see the platform log")]
    PlatformExited { code: Option<i32> },
}

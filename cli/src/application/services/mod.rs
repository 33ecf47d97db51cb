//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`; never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod environment;
pub mod sequencer;
pub mod supervisor;

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::CommandRunner;
use crate::domain::error::ExternalProcessError;

/// Run an external tool with its output passed through, failing on non-zero exit.
///
/// # Errors
///
/// Returns `ExternalProcessError` carrying the tool's exit code when it fails,
/// or an error if it cannot be spawned.
pub async fn exec_checked(runner: &impl CommandRunner, program: &Path, args: &[String]) -> Result<()> {
    let program = program.to_string_lossy();
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    tracing::debug!(%program, args = ?arg_refs, "running");

    let status = runner
        .run_status(&program, &arg_refs)
        .await
        .with_context(|| format!("running {program}"))?;

    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(ExternalProcessError::Failed {
            program: program.into_owned(),
            code,
        }
        .into()),
        None => Err(ExternalProcessError::Signaled {
            program: program.into_owned(),
        }
        .into()),
    }
}

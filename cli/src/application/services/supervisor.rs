//! Platform supervision: launch the platform and wait until it is reachable.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::Instant;

use crate::application::ports::{
    CommandRunner, PlatformLaunch, PlatformLauncher, PlatformProcess, ProgressReporter,
};
use crate::domain::error::ReadinessError;
use crate::domain::invocations::{self, CONTROL_PEER};
use crate::domain::readiness::{Observation, PlatformState, ReadyPolicy, next_state};
use crate::domain::settings::BootstrapSettings;

/// How the platform process should be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformOptions<'a> {
    pub verbosity: &'a str,
    pub vip_address: &'a str,
    pub instance_name: &'a str,
}

/// Spawn the platform with its output teed to `<home>/volttron.log`.
///
/// # Errors
///
/// Returns an error if the launcher cannot start the process.
pub fn start<L: PlatformLauncher>(
    launcher: &L,
    settings: &BootstrapSettings,
    opts: &PlatformOptions<'_>,
) -> Result<L::Process> {
    let program = settings.toolchain().platform();
    let args = invocations::start_platform(opts.verbosity, opts.vip_address, opts.instance_name);
    let log_path = settings.log_path();

    tracing::info!(
        program = %program.display(),
        args = ?args,
        log = %log_path.display(),
        "starting platform",
    );
    launcher
        .launch(&PlatformLaunch {
            program: &program,
            args: &args,
            log_path: &log_path,
        })
        .context("starting platform")
}

/// Poll the control CLI until the platform's control peer is listed.
///
/// Query failures are treated as "not ready yet". The wait ends early if the
/// platform process exits, and fails once `policy.timeout` elapses.
///
/// # Errors
///
/// Returns `ReadinessError::PlatformExited` or `ReadinessError::TimedOut`.
pub async fn wait_ready(
    runner: &impl CommandRunner,
    process: &mut impl PlatformProcess,
    control: &Path,
    policy: &ReadyPolicy,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    reporter.step(&format!("waiting for {CONTROL_PEER} to come online..."));
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let query_timeout = policy.query_timeout(started.elapsed());
        let observation = observe(runner, process, control, query_timeout).await?;
        let elapsed = started.elapsed();

        match next_state(&observation, elapsed, policy) {
            PlatformState::Ready => {
                tracing::info!(attempt, ?elapsed, "platform ready");
                reporter.success("platform ready");
                return Ok(());
            }
            PlatformState::Exited { code } => {
                return Err(ReadinessError::PlatformExited { code }.into());
            }
            PlatformState::TimedOut => {
                return Err(ReadinessError::TimedOut {
                    peer: CONTROL_PEER,
                    elapsed,
                }
                .into());
            }
            PlatformState::Starting => {
                tracing::debug!(attempt, ?observation, "platform not ready yet");
                tokio::time::sleep(policy.pause(elapsed)).await;
            }
        }
    }
}

/// One poll round: liveness first, then the peer listing.
async fn observe(
    runner: &impl CommandRunner,
    process: &mut impl PlatformProcess,
    control: &Path,
    query_timeout: Duration,
) -> Result<Observation> {
    if let Some(status) = process.try_wait()? {
        return Ok(Observation::ProcessExited {
            code: status.code(),
        });
    }

    let program = control.to_string_lossy();
    let args = invocations::peerlist();
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

    Ok(
        match runner
            .run_with_timeout(&program, &arg_refs, query_timeout)
            .await
        {
            Ok(output) if output.status.success() => {
                Observation::PeerListing(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                tracing::debug!(
                    code = ?output.status.code(),
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "peer query failed",
                );
                Observation::QueryFailed
            }
            Err(e) => {
                tracing::debug!(error = %e, "peer query could not run");
                Observation::QueryFailed
            }
        },
    )
}

//! Environment provisioning: virtual environment, platform package, libraries.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, LocalFs, Marker, MarkerStore, ProgressReporter};
use crate::application::services::exec_checked;
use crate::domain::invocations;
use crate::domain::settings::BootstrapSettings;

/// Create the virtual environment unless its interpreter already exists.
///
/// # Errors
///
/// Returns an error if `python -m venv` fails.
pub async fn ensure_environment(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    settings: &BootstrapSettings,
) -> Result<()> {
    let toolchain = settings.toolchain();
    if fs.exists(&toolchain.python()) {
        tracing::debug!(venv = %settings.venv_dir.display(), "virtual environment present");
        return Ok(());
    }

    reporter.step("building virtual environment...");
    exec_checked(
        runner,
        Path::new(&settings.python),
        &invocations::create_venv(&settings.venv_dir),
    )
    .await
    .context("creating virtual environment")?;
    reporter.success("virtual environment ready");
    Ok(())
}

/// Install the platform package once per environment.
///
/// # Errors
///
/// Returns an error if `pip install` fails or the marker cannot be written.
pub async fn ensure_platform_installed(
    runner: &impl CommandRunner,
    markers: &impl MarkerStore,
    reporter: &impl ProgressReporter,
    settings: &BootstrapSettings,
) -> Result<()> {
    if markers.is_set(Marker::PlatformInstalled)? {
        tracing::debug!("platform package already installed");
        return Ok(());
    }

    reporter.step("installing volttron...");
    let args = invocations::install_platform(
        settings.platform_version.as_deref(),
        settings.pip_cache_dir.as_deref(),
    );
    exec_checked(runner, &settings.toolchain().pip(), &args)
        .await
        .context("installing platform package")?;
    markers.set(Marker::PlatformInstalled)?;
    reporter.success("volttron installed");
    Ok(())
}

/// Install every requested library in a single installer call.
///
/// # Errors
///
/// Returns an error if `pip install` fails.
pub async fn ensure_libraries(
    runner: &impl CommandRunner,
    reporter: &impl ProgressReporter,
    settings: &BootstrapSettings,
    libraries: &BTreeSet<String>,
) -> Result<()> {
    if libraries.is_empty() {
        return Ok(());
    }

    let names: Vec<&str> = libraries.iter().map(String::as_str).collect();
    reporter.step(&format!("installing libraries: {}", names.join(", ")));
    let args = invocations::install_libraries(libraries, settings.pip_cache_dir.as_deref());
    exec_checked(runner, &settings.toolchain().pip(), &args)
        .await
        .context("installing libraries")?;
    reporter.success("libraries installed");
    Ok(())
}

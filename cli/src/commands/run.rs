//! Run command: resolve settings from flags and environment, then bootstrap.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use clap::builder::FalseyValueParser;

use crate::app::AppContext;
use crate::application::services::sequencer::{self, Outcome};
use crate::domain::error::EnvironmentError;
use crate::domain::settings::BootstrapSettings;
use crate::output::TerminalReporter;

/// Platform home used when `VOLTTRON_HOME` is unset, relative to `$HOME`.
const DEFAULT_HOME_DIR: &str = ".volttron";

/// Arguments for the run command. Every flag has an environment binding so
/// the container can be configured without a command line.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Platform config document; starts a bare platform when unset
    #[arg(long, env = "PLATFORM_CONFIG")]
    pub platform_config: Option<PathBuf>,

    /// Re-run the install sequence even if it completed before. REINITIALIZE
    /// counts as off when empty or one of 0, false, f, no, n, off
    #[arg(long, env = "REINITIALIZE", value_parser = FalseyValueParser::new())]
    pub reinitialize: bool,

    /// Virtual environment the platform is installed into
    #[arg(long = "venv", env = "VOLTTRON_VENV")]
    pub venv_dir: Option<PathBuf>,

    /// Platform home directory [default: ~/.volttron]
    #[arg(long = "home", env = "VOLTTRON_HOME")]
    pub home_dir: Option<PathBuf>,

    /// Directory agent configs and config-store files are read from
    #[arg(long, env = "PLATFORM_CONFIG_DIR", default_value = "/config")]
    pub config_dir: PathBuf,

    /// Package cache handed to pip
    #[arg(long, env = "PIP_CACHE_DIR")]
    pub pip_cache_dir: Option<PathBuf>,

    /// Exact platform package version to install [default: latest]
    #[arg(long, env = "VOLTTRON_VERSION")]
    pub platform_version: Option<String>,

    /// Default instance name when the config does not set one
    #[arg(long, env = "HOSTNAME")]
    pub hostname: Option<String>,

    /// Give up waiting for the platform after this many seconds
    #[arg(long = "ready-timeout", env = "PLATFORM_READY_TIMEOUT", value_name = "SECS")]
    pub ready_timeout_secs: Option<u64>,

    /// Interpreter used to create the virtual environment
    #[arg(long, env = "BOOTSTRAP_PYTHON", default_value = "python3")]
    pub python: String,
}

impl RunArgs {
    /// Resolve settings against the current user's home directory.
    ///
    /// # Errors
    ///
    /// See [`RunArgs::resolve`].
    pub fn settings(&self) -> Result<BootstrapSettings, EnvironmentError> {
        self.resolve(dirs::home_dir())
    }

    /// Resolve settings, falling back to `<user_home>/.volttron` for the
    /// platform home. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `EnvironmentError::MissingVariable` when no virtual environment
    /// is given and `EnvironmentError::NoHomeDirectory` when neither a platform
    /// home nor a user home is known.
    pub fn resolve(&self, user_home: Option<PathBuf>) -> Result<BootstrapSettings, EnvironmentError> {
        let venv_dir = non_empty_path(self.venv_dir.as_ref())
            .ok_or(EnvironmentError::MissingVariable("VOLTTRON_VENV"))?;
        let home_dir = match non_empty_path(self.home_dir.as_ref()) {
            Some(home) => home,
            None => user_home
                .ok_or(EnvironmentError::NoHomeDirectory)?
                .join(DEFAULT_HOME_DIR),
        };

        let settings = BootstrapSettings {
            platform_config: non_empty_path(self.platform_config.as_ref()),
            reinitialize: self.reinitialize,
            venv_dir,
            home_dir,
            config_dir: self.config_dir.clone(),
            pip_cache_dir: non_empty_path(self.pip_cache_dir.as_ref()),
            platform_version: non_empty(self.platform_version.as_ref()),
            hostname: non_empty(self.hostname.as_ref()),
            python: self.python.clone(),
            ready_timeout: self.ready_timeout_secs.map(Duration::from_secs),
        };
        tracing::debug!(?settings, "bootstrap settings resolved");
        Ok(settings)
    }
}

fn non_empty_path(value: Option<&PathBuf>) -> Option<PathBuf> {
    value.filter(|p| !p.as_os_str().is_empty()).cloned()
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.is_empty()).cloned()
}

/// Entry point for `volttron-bootstrap run`. Returns the process exit code.
///
/// # Errors
///
/// Returns the first failure of the bootstrap sequence.
pub async fn run(app: &AppContext) -> Result<i32> {
    let reporter = TerminalReporter::new(&app.output);
    match sequencer::run(&app.ports(), &app.settings, &reporter).await? {
        Outcome::AlreadyInitialized => Ok(0),
        Outcome::PlatformExited(status) => Ok(status.code().unwrap_or(1)),
    }
}

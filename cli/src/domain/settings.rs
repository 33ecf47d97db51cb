//! Resolved bootstrap settings and the paths derived from them.
//!
//! Built once at the entry point from CLI flags and environment variables,
//! then passed by reference to every service. Nothing below the entry point
//! reads the process environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::config::ConfigDefaults;

pub const SERVICE_CONFIG_FILE: &str = "service_config.yml";
pub const PLATFORM_LOG_FILE: &str = "volttron.log";
pub const INSTALL_MARKER_FILE: &str = "initialize_volttron";
pub const COMPLETION_MARKER_FILE: &str = "initialized";

/// Everything a bootstrap run needs to know about its surroundings.
#[derive(Debug, Clone)]
pub struct BootstrapSettings {
    /// Platform document; `None` starts a bare platform.
    pub platform_config: Option<PathBuf>,
    /// Re-run the install sequence even when the completion marker exists.
    pub reinitialize: bool,
    /// Virtual environment the platform is installed into.
    pub venv_dir: PathBuf,
    /// Platform home directory (`VOLTTRON_HOME`).
    pub home_dir: PathBuf,
    /// Directory agent configs and config-store files are resolved against.
    pub config_dir: PathBuf,
    pub pip_cache_dir: Option<PathBuf>,
    /// Exact platform package version; latest when unset.
    pub platform_version: Option<String>,
    pub hostname: Option<String>,
    /// Interpreter used to create the virtual environment.
    pub python: String,
    /// Upper bound on the readiness wait; unbounded when unset.
    pub ready_timeout: Option<Duration>,
}

impl BootstrapSettings {
    #[must_use]
    pub fn service_config_path(&self) -> PathBuf {
        self.home_dir.join(SERVICE_CONFIG_FILE)
    }

    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.home_dir.join(PLATFORM_LOG_FILE)
    }

    /// Resolve a file named in the platform document against the config directory.
    #[must_use]
    pub fn config_file(&self, name: &str) -> PathBuf {
        self.config_dir.join(name)
    }

    #[must_use]
    pub fn toolchain(&self) -> Toolchain {
        Toolchain::new(&self.venv_dir)
    }

    #[must_use]
    pub fn config_defaults(&self) -> ConfigDefaults {
        ConfigDefaults {
            instance_name: self.hostname.clone().filter(|h| !h.is_empty()),
        }
    }
}

/// Executables inside the virtual environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    bin_dir: PathBuf,
}

impl Toolchain {
    #[must_use]
    pub fn new(venv_dir: &Path) -> Self {
        Self {
            bin_dir: venv_dir.join("bin"),
        }
    }

    #[must_use]
    pub fn python(&self) -> PathBuf {
        self.bin_dir.join("python")
    }

    #[must_use]
    pub fn pip(&self) -> PathBuf {
        self.bin_dir.join("pip")
    }

    /// The platform executable.
    #[must_use]
    pub fn platform(&self) -> PathBuf {
        self.bin_dir.join("volttron")
    }

    /// The control CLI.
    #[must_use]
    pub fn control(&self) -> PathBuf {
        self.bin_dir.join("vctl")
    }
}

//! Application context: the production wiring handed to the `run` command.
//!
//! `AppContext` owns the resolved settings, the output context and one
//! concrete adapter per port, so the command handler only borrows them.

use crate::application::services::sequencer::Ports;
use crate::domain::settings::BootstrapSettings;
use crate::infra::command_runner::{ChildEnv, TokioCommandRunner};
use crate::infra::fs::LocalFs;
use crate::infra::markers::FileMarkerStore;
use crate::infra::platform::TokioPlatformLauncher;
use crate::output::OutputContext;

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output, including the mirrored platform output.
    pub quiet: bool,
}

/// Unified application context for a bootstrap run.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    pub settings: BootstrapSettings,
    pub runner: TokioCommandRunner,
    pub markers: FileMarkerStore,
    pub fs: LocalFs,
    pub launcher: TokioPlatformLauncher,
}

impl AppContext {
    /// Construct the production adapters for `settings`.
    #[must_use]
    pub fn new(flags: &OutputFlags, settings: BootstrapSettings) -> Self {
        let env = ChildEnv::venv(&settings.venv_dir);
        let launcher = TokioPlatformLauncher::new(env.clone());
        let launcher = if flags.quiet {
            launcher.log_only()
        } else {
            launcher
        };

        Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            runner: TokioCommandRunner::new().with_env(env),
            markers: FileMarkerStore::new(&settings.home_dir),
            fs: LocalFs,
            launcher,
            settings,
        }
    }

    /// Borrow the adapters as the sequencer's port bundle.
    #[must_use]
    pub fn ports(
        &self,
    ) -> Ports<'_, TokioCommandRunner, FileMarkerStore, LocalFs, TokioPlatformLauncher> {
        Ports {
            runner: &self.runner,
            markers: &self.markers,
            fs: &self.fs,
            launcher: &self.launcher,
        }
    }
}

//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, OutputFlags};
use crate::commands;
use crate::domain::error::ExternalProcessError;
use crate::output::OutputContext;

/// Bootstrap a VOLTTRON platform container
#[derive(Parser)]
#[command(
    name = "volttron-bootstrap",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (also disabled when NO_COLOR is set)
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision the environment, start the platform and install agents
    Run(commands::run::RunArgs),

    /// Parse a platform config and print what it would set up
    Validate(commands::validate::ValidateArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command and return the process exit code.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails; see [`exit_code`] for how it
    /// maps to the process exit status.
    pub async fn run(self) -> Result<i32> {
        let Cli {
            quiet,
            no_color,
            command,
        } = self;
        let flags = OutputFlags { no_color, quiet };
        match command {
            Command::Run(args) => {
                let settings = args.settings()?;
                let app = AppContext::new(&flags, settings);
                commands::run::run(&app).await
            }
            Command::Validate(args) => {
                let ctx = OutputContext::new(flags.no_color, flags.quiet);
                commands::validate::run(&ctx, &args)?;
                Ok(0)
            }
            Command::Version => {
                commands::version::run();
                Ok(0)
            }
        }
    }
}

/// Exit code for a failed run: a failing tool's own code when one is in the
/// error chain, otherwise 1.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ExternalProcessError>())
        .map_or(1, ExternalProcessError::exit_code)
}

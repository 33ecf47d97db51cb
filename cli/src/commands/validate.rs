//! Validate command: parse a platform config and summarize it without side effects.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use crate::application::ports::LocalFs as _;
use crate::application::services::sequencer::load_platform_config;
use crate::domain::config::{AgentConfigRef, ConfigDefaults, PlatformConfig};
use crate::infra::fs::LocalFs;
use crate::output::OutputContext;

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Platform config document to check
    pub path: PathBuf,

    /// Directory referenced files are checked against
    #[arg(long, env = "PLATFORM_CONFIG_DIR", default_value = "/config")]
    pub config_dir: PathBuf,

    /// Default instance name when the config does not set one
    #[arg(long, env = "HOSTNAME")]
    pub hostname: Option<String>,
}

/// Entry point for `volttron-bootstrap validate`.
///
/// Referenced files that are missing are reported as warnings: the config
/// directory is usually only mounted inside the container.
///
/// # Errors
///
/// Returns a `ConfigError` if the document is missing or invalid.
pub fn run(ctx: &OutputContext, args: &ValidateArgs) -> Result<()> {
    let defaults = ConfigDefaults {
        instance_name: args.hostname.clone().filter(|h| !h.is_empty()),
    };
    let config = load_platform_config(&LocalFs, &args.path, &defaults)?;

    print_summary(ctx, &args.path, &config);
    for missing in missing_files(&config, &args.config_dir) {
        ctx.warn(&format!("referenced file not found: {}", missing.display()));
    }
    ctx.success("platform config is valid");
    Ok(())
}

fn print_summary(ctx: &OutputContext, path: &Path, config: &PlatformConfig) {
    ctx.header(&path.display().to_string());
    ctx.kv("vip-address   ", &config.vip_address);
    ctx.kv("instance-name ", &config.instance_name);
    ctx.kv("verbosity     ", &config.verbosity);

    for service in &config.services {
        let state = if service.enabled { "enabled" } else { "disabled" };
        ctx.kv("service       ", &format!("{} ({state})", service.service));
    }
    for agent in &config.agents {
        ctx.kv("agent         ", &format!("{} <- {}", agent.identity, agent.source));
        for entry in &agent.config_store {
            ctx.kv("  config-store", &format!("{} <- {}", entry.name, entry.file));
        }
    }

    let libraries = config.libraries();
    if !libraries.is_empty() {
        let names: Vec<&str> = libraries.iter().map(String::as_str).collect();
        ctx.kv("libraries     ", &names.join(" "));
    }
}

/// Agent config and config-store files that do not exist under `config_dir`.
fn missing_files(config: &PlatformConfig, config_dir: &Path) -> Vec<PathBuf> {
    let fs = LocalFs;
    let mut referenced = Vec::new();
    for agent in &config.agents {
        if let Some(AgentConfigRef::File(name)) = &agent.config {
            referenced.push(config_dir.join(name));
        }
        referenced.extend(agent.config_store.iter().map(|e| config_dir.join(&e.file)));
    }
    referenced.retain(|p| !fs.exists(p));
    referenced
}

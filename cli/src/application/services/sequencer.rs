//! Application service: the bootstrap sequence.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.
//!
//! Ordering: environment → platform package → (document) → libraries →
//! service config → platform start → readiness → agents in document order,
//! each followed by its config-store writes → completion marker → wait on
//! the platform.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use anyhow::{Context, Result};

use crate::application::ports::{
    CommandRunner, LocalFs, Marker, MarkerStore, PlatformLauncher, PlatformProcess,
    ProgressReporter,
};
use crate::application::services::supervisor::{self, PlatformOptions};
use crate::application::services::{environment, exec_checked};
use crate::domain::config::{
    AgentConfig, AgentConfigRef, ConfigDefaults, DEFAULT_INSTANCE_NAME, DEFAULT_VERBOSITY,
    DEFAULT_VIP_ADDRESS, PlatformConfig,
};
use crate::domain::error::ConfigError;
use crate::domain::invocations;
use crate::domain::readiness::ReadyPolicy;
use crate::domain::settings::BootstrapSettings;

/// Ports the bootstrap sequence runs against.
pub struct Ports<'a, R, M, F, L> {
    pub runner: &'a R,
    pub markers: &'a M,
    pub fs: &'a F,
    pub launcher: &'a L,
}

/// How a bootstrap run ended.
#[derive(Debug)]
pub enum Outcome {
    /// The completion marker was present; nothing was started.
    AlreadyInitialized,
    /// The platform ran and has now exited.
    PlatformExited(ExitStatus),
}

/// Run the full bootstrap.
///
/// # Errors
///
/// Returns the first failure: `ConfigError` for document problems,
/// `ExternalProcessError` for installer or control CLI failures,
/// `ReadinessError` when the platform never comes up.
pub async fn run<R, M, F, L>(
    ports: &Ports<'_, R, M, F, L>,
    settings: &BootstrapSettings,
    reporter: &impl ProgressReporter,
) -> Result<Outcome>
where
    R: CommandRunner,
    M: MarkerStore,
    F: LocalFs,
    L: PlatformLauncher,
{
    let Ports { runner, markers, fs, .. } = *ports;

    environment::ensure_environment(runner, fs, reporter, settings).await?;
    fs.create_dir_all(&settings.home_dir)?;
    environment::ensure_platform_installed(runner, markers, reporter, settings).await?;

    let Some(document) = settings.platform_config.as_deref() else {
        reporter.step("no platform config given; starting default platform...");
        let instance_name = settings
            .config_defaults()
            .instance_name
            .unwrap_or_else(|| DEFAULT_INSTANCE_NAME.to_string());
        let opts = PlatformOptions {
            verbosity: DEFAULT_VERBOSITY,
            vip_address: DEFAULT_VIP_ADDRESS,
            instance_name: &instance_name,
        };
        let platform = start_and_wait(ports, settings, &opts, reporter).await?;
        return serve(platform).await;
    };

    if !fs.exists(document) {
        return Err(ConfigError::NotFound(document.to_path_buf()).into());
    }
    if markers.is_set(Marker::InstallCompleted)? && !settings.reinitialize {
        tracing::info!("completion marker present; nothing to do");
        reporter.success("platform already initialized");
        return Ok(Outcome::AlreadyInitialized);
    }

    let config = load_platform_config(fs, document, &settings.config_defaults())?;
    tracing::info!(
        services = config.services.len(),
        agents = config.agents.len(),
        vip_address = %config.vip_address,
        instance_name = %config.instance_name,
        "platform config loaded",
    );

    environment::ensure_libraries(runner, reporter, settings, &config.libraries()).await?;

    if !config.services.is_empty() {
        write_service_config(fs, settings, &config)?;
    }

    let opts = PlatformOptions {
        verbosity: &config.verbosity,
        vip_address: &config.vip_address,
        instance_name: &config.instance_name,
    };
    let platform = start_and_wait(ports, settings, &opts, reporter).await?;

    if !config.agents.is_empty() {
        reporter.step("installing agents...");
        for agent in &config.agents {
            install_agent(runner, fs, settings, reporter, agent).await?;
        }
    }

    markers.set(Marker::InstallCompleted)?;
    reporter.success("platform initialized");

    serve(platform).await
}

/// Read and parse the platform document.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file is missing and
/// `ConfigError::Parse` if it cannot be parsed.
pub fn load_platform_config(
    fs: &impl LocalFs,
    path: &Path,
    defaults: &ConfigDefaults,
) -> Result<PlatformConfig> {
    if !fs.exists(path) {
        return Err(ConfigError::NotFound(path.to_path_buf()).into());
    }
    let text = fs.read_to_string(path)?;
    PlatformConfig::parse(&text, defaults)
        .map_err(|e| match e {
            ConfigError::Invalid(source) => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
        .map_err(Into::into)
}

/// Write `<home>/service_config.yml`, replacing any previous copy.
///
/// # Errors
///
/// Returns an error if the file cannot be serialized or written.
pub fn write_service_config(
    fs: &impl LocalFs,
    settings: &BootstrapSettings,
    config: &PlatformConfig,
) -> Result<PathBuf> {
    let path = settings.service_config_path();
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)?;
    }
    let content = serde_yaml::to_string(&config.service_config_document())
        .context("serializing service config")?;
    fs.write(&path, content)?;
    tracing::info!(path = %path.display(), services = config.services.len(), "service config written");
    Ok(path)
}

async fn start_and_wait<R, M, F, L>(
    ports: &Ports<'_, R, M, F, L>,
    settings: &BootstrapSettings,
    opts: &PlatformOptions<'_>,
    reporter: &impl ProgressReporter,
) -> Result<L::Process>
where
    R: CommandRunner,
    L: PlatformLauncher,
{
    reporter.step("starting platform...");
    let mut platform = supervisor::start(ports.launcher, settings, opts)?;
    let policy = ReadyPolicy::with_timeout(settings.ready_timeout);
    supervisor::wait_ready(
        ports.runner,
        &mut platform,
        &settings.toolchain().control(),
        &policy,
        reporter,
    )
    .await?;
    Ok(platform)
}

async fn serve(platform: impl PlatformProcess) -> Result<Outcome> {
    let status = platform.wait().await.context("waiting on platform")?;
    tracing::info!(code = ?status.code(), "platform exited");
    Ok(Outcome::PlatformExited(status))
}

/// Install one agent, then populate its config store.
async fn install_agent(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    settings: &BootstrapSettings,
    reporter: &impl ProgressReporter,
    agent: &AgentConfig,
) -> Result<()> {
    reporter.step(&format!("installing agent {}", agent.identity));

    // Holds the inline config file until the install call returns.
    let mut inline_dir = None;
    let agent_config = match &agent.config {
        Some(AgentConfigRef::File(name)) => {
            let path = settings.config_file(name);
            if fs.exists(&path) {
                Some(path)
            } else {
                reporter.warn(&format!(
                    "agent config {} not found; installing {} without it",
                    path.display(),
                    agent.identity
                ));
                None
            }
        }
        Some(AgentConfigRef::Inline(config)) => {
            let dir = tempfile::tempdir().context("creating temp dir for inline agent config")?;
            let path = dir.path().join(format!("{}.config", agent.identity));
            let content =
                serde_json::to_string_pretty(config).context("serializing inline agent config")?;
            fs.write(&path, content)?;
            inline_dir = Some(dir);
            Some(path)
        }
        None => None,
    };

    exec_checked(
        runner,
        &settings.toolchain().control(),
        &invocations::install_agent(agent, agent_config.as_deref()),
    )
    .await
    .with_context(|| format!("installing agent {}", agent.identity))?;
    drop(inline_dir);

    let mut entries = Vec::with_capacity(agent.config_store.len());
    for entry in &agent.config_store {
        let file = settings.config_file(&entry.file);
        if !fs.exists(&file) {
            return Err(ConfigError::MissingConfigStoreFile {
                identity: agent.identity.clone(),
                path: file,
            }
            .into());
        }
        entries.push((entry, file));
    }

    for (entry, file) in entries {
        tracing::info!(identity = %agent.identity, name = %entry.name, file = %file.display(), "storing config");
        exec_checked(
            runner,
            &settings.toolchain().control(),
            &invocations::store_config(&agent.identity, entry, &file),
        )
        .await
        .with_context(|| format!("storing config '{}' for {}", entry.name, agent.identity))?;
    }

    reporter.success(&format!("agent {} installed", agent.identity));
    Ok(())
}

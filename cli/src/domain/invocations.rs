//! Argument vectors for the installer, the platform and the control CLI.
//!
//! Pure functions only. Callers pair these with the matching `Toolchain`
//! executable and hand them to a `CommandRunner`.

use std::collections::BTreeSet;
use std::path::Path;

use crate::domain::config::{AgentConfig, ConfigStoreEntry};

/// Peer identity the platform's own control agent registers under.
pub const CONTROL_PEER: &str = "platform.control";

/// Platform package installed into the virtual environment.
pub const PLATFORM_PACKAGE: &str = "volttron";

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `<python> -m venv <dir>`
#[must_use]
pub fn create_venv(venv_dir: &Path) -> Vec<String> {
    vec!["-m".into(), "venv".into(), path_arg(venv_dir)]
}

fn pip_install(cache_dir: Option<&Path>) -> Vec<String> {
    let mut args = vec!["install".to_string()];
    if let Some(dir) = cache_dir {
        args.push("--cache-dir".into());
        args.push(path_arg(dir));
    }
    args
}

/// `pip install volttron --upgrade`, or an exact pin when `version` is set.
#[must_use]
pub fn install_platform(version: Option<&str>, cache_dir: Option<&Path>) -> Vec<String> {
    let mut args = pip_install(cache_dir);
    match version.filter(|v| !v.is_empty()) {
        Some(v) => args.push(format!("{PLATFORM_PACKAGE}=={v}")),
        None => {
            args.push(PLATFORM_PACKAGE.into());
            args.push("--upgrade".into());
        }
    }
    args
}

/// One `pip install` for every library at once.
#[must_use]
pub fn install_libraries(libraries: &BTreeSet<String>, cache_dir: Option<&Path>) -> Vec<String> {
    let mut args = pip_install(cache_dir);
    args.extend(libraries.iter().cloned());
    args
}

/// Flags for the platform executable.
#[must_use]
pub fn start_platform(verbosity: &str, vip_address: &str, instance_name: &str) -> Vec<String> {
    let mut args = Vec::with_capacity(5);
    if !verbosity.is_empty() {
        args.push(verbosity.to_string());
    }
    args.extend([
        "--vip-address".to_string(),
        vip_address.to_string(),
        "--instance-name".to_string(),
        instance_name.to_string(),
    ]);
    args
}

/// `vctl peerlist`
#[must_use]
pub fn peerlist() -> Vec<String> {
    vec!["peerlist".into()]
}

/// Whether a `vctl peerlist` listing contains the control agent.
#[must_use]
pub fn lists_control_peer(listing: &str) -> bool {
    listing.split_whitespace().any(|peer| peer == CONTROL_PEER)
}

/// `vctl install --vip-identity <id> --force --enable --start [--tag t] [--agent-config f] <source>`
#[must_use]
pub fn install_agent(agent: &AgentConfig, agent_config: Option<&Path>) -> Vec<String> {
    let mut args = vec![
        "install".to_string(),
        "--vip-identity".to_string(),
        agent.identity.clone(),
        "--force".to_string(),
        "--enable".to_string(),
        "--start".to_string(),
    ];
    if let Some(tag) = &agent.tag {
        args.push("--tag".into());
        args.push(tag.clone());
    }
    if let Some(path) = agent_config {
        args.push("--agent-config".into());
        args.push(path_arg(path));
    }
    args.push(agent.source.clone());
    args
}

/// `vctl config store <id> <name> <file> [<type>]`
#[must_use]
pub fn store_config(identity: &str, entry: &ConfigStoreEntry, file: &Path) -> Vec<String> {
    let mut args = vec![
        "config".to_string(),
        "store".to_string(),
        identity.to_string(),
        entry.name.clone(),
        path_arg(file),
    ];
    if let Some(kind) = &entry.value_type {
        args.push(kind.clone());
    }
    args
}

//! Platform config document: typed entities and the pure parser.
//!
//! Pure functions only: no I/O, no async, no filesystem access. Reading the
//! document from disk lives in the application layer.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_VIP_ADDRESS: &str = "tcp://127.0.0.1:22916";
pub const DEFAULT_INSTANCE_NAME: &str = "volttron1";
pub const DEFAULT_VERBOSITY: &str = "-v";

// ── Entities ─────────────────────────────────────────────────────────────────

/// Values the document falls back to when it leaves a setting out.
#[derive(Debug, Clone, Default)]
pub struct ConfigDefaults {
    /// Instance name used when `config.instance-name` is absent (the host name).
    pub instance_name: Option<String>,
}

/// Root of a parsed platform document.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformConfig {
    pub vip_address: String,
    pub instance_name: String,
    /// Verbosity flag handed to the platform executable, e.g. `-vv`.
    pub verbosity: String,
    pub services: Vec<ServiceConfig>,
    pub agents: Vec<AgentConfig>,
}

/// A platform service toggled through `service_config.yml`.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub service: String,
    pub enabled: bool,
    pub libraries: Vec<String>,
    /// Passed through to the service untouched.
    pub kwargs: Mapping,
}

/// An agent installed through the control CLI once the platform is up.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// VIP identity; the join key for install and config-store calls.
    pub identity: String,
    pub source: String,
    pub libraries: Vec<String>,
    pub config: Option<AgentConfigRef>,
    pub tag: Option<String>,
    pub config_store: Vec<ConfigStoreEntry>,
}

/// Agent config given either as a file under the config directory or inline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AgentConfigRef {
    File(String),
    Inline(Mapping),
}

/// A config-store entry populated from a local file after install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStoreEntry {
    pub name: String,
    /// Path relative to the config directory.
    pub file: String,
    /// Type flag forwarded to `vctl config store`, e.g. `--json`.
    pub value_type: Option<String>,
}

/// One line of the derived `service_config.yml`.
#[derive(Debug, Serialize)]
pub struct ServiceEntry<'a> {
    pub enabled: bool,
    pub kwargs: &'a Mapping,
}

// ── Raw document shape ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    config: Option<Mapping>,
    #[serde(default)]
    services: Option<IdentityMap<RawService>>,
    #[serde(default)]
    agents: Option<IdentityMap<RawAgent>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    vip_address: Option<String>,
    instance_name: Option<String>,
    verbosity: Option<String>,
}

const SETTINGS_KEYS: &[&str] = &["vip_address", "instance_name", "verbosity"];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawService {
    enabled: bool,
    #[serde(default)]
    libraries: Option<Vec<String>>,
    #[serde(default)]
    kwargs: Option<Mapping>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAgent {
    source: String,
    #[serde(default)]
    libraries: Option<Vec<String>>,
    #[serde(default)]
    config: Option<AgentConfigRef>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    config_store: Option<IdentityMap<RawConfigStoreEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfigStoreEntry {
    file: String,
    #[serde(default, rename = "type")]
    value_type: Option<String>,
}

/// A YAML mapping kept as an ordered list so document order survives and
/// repeated keys stay visible to validation.
#[derive(Debug)]
struct IdentityMap<T>(Vec<(String, T)>);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for IdentityMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = IdentityMap<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map keyed by identity")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(IdentityMap(Vec::new()))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(IdentityMap(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

impl<T> IdentityMap<T> {
    fn ensure_unique(&self, section: &'static str) -> Result<(), ConfigError> {
        let mut seen = HashSet::with_capacity(self.0.len());
        for (identity, _) in &self.0 {
            if !seen.insert(identity.as_str()) {
                return Err(ConfigError::DuplicateIdentity {
                    section,
                    identity: identity.clone(),
                });
            }
        }
        Ok(())
    }
}

// ── Parsing ──────────────────────────────────────────────────────────────────

/// Rewrite hyphenated string keys to underscores (`vip-address` → `vip_address`).
///
/// Only the top level is rewritten; nested values are left as written.
#[must_use]
pub fn normalize_keys(mapping: Mapping) -> Mapping {
    mapping
        .into_iter()
        .map(|(key, value)| match key {
            Value::String(k) => (Value::String(k.replace('-', "_")), value),
            other => (other, value),
        })
        .collect()
}

impl PlatformConfig {
    /// Parse a platform document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the YAML does not have the expected
    /// shape (including unknown keys on services, agents and config-store
    /// entries) and `ConfigError::DuplicateIdentity` if a service or agent is
    /// declared twice.
    pub fn parse(text: &str, defaults: &ConfigDefaults) -> Result<Self, ConfigError> {
        let raw: RawDocument = serde_yaml::from_str(text)?;

        let settings_map = normalize_keys(raw.config.unwrap_or_default());
        let ignored: Vec<&str> = settings_map
            .keys()
            .filter_map(Value::as_str)
            .filter(|k| !SETTINGS_KEYS.contains(k))
            .collect();
        if !ignored.is_empty() {
            tracing::debug!(keys = ?ignored, "ignoring unrecognised config keys");
        }
        let settings: RawSettings = serde_yaml::from_value(Value::Mapping(settings_map))?;

        let services = raw.services.unwrap_or(IdentityMap(Vec::new()));
        services.ensure_unique("service")?;
        let agents = raw.agents.unwrap_or(IdentityMap(Vec::new()));
        agents.ensure_unique("agent")?;

        Ok(Self {
            vip_address: settings
                .vip_address
                .unwrap_or_else(|| DEFAULT_VIP_ADDRESS.to_string()),
            instance_name: settings
                .instance_name
                .or_else(|| defaults.instance_name.clone())
                .unwrap_or_else(|| DEFAULT_INSTANCE_NAME.to_string()),
            verbosity: settings
                .verbosity
                .unwrap_or_else(|| DEFAULT_VERBOSITY.to_string()),
            services: services
                .0
                .into_iter()
                .map(|(service, raw)| ServiceConfig {
                    service,
                    enabled: raw.enabled,
                    libraries: raw.libraries.unwrap_or_default(),
                    kwargs: raw.kwargs.unwrap_or_default(),
                })
                .collect(),
            agents: agents
                .0
                .into_iter()
                .map(|(identity, raw)| AgentConfig::from_raw(identity, raw))
                .collect(),
        })
    }

    /// Union of the libraries every service and agent asks for.
    #[must_use]
    pub fn libraries(&self) -> BTreeSet<String> {
        self.services
            .iter()
            .flat_map(|s| s.libraries.iter())
            .chain(self.agents.iter().flat_map(|a| a.libraries.iter()))
            .cloned()
            .collect()
    }

    /// The `service_config.yml` content: service name → `{enabled, kwargs}`.
    #[must_use]
    pub fn service_config_document(&self) -> BTreeMap<&str, ServiceEntry<'_>> {
        self.services
            .iter()
            .map(|s| {
                (
                    s.service.as_str(),
                    ServiceEntry {
                        enabled: s.enabled,
                        kwargs: &s.kwargs,
                    },
                )
            })
            .collect()
    }
}

impl AgentConfig {
    fn from_raw(identity: String, raw: RawAgent) -> Self {
        let config_store = raw
            .config_store
            .map(|entries| {
                entries
                    .0
                    .into_iter()
                    .map(|(name, entry)| ConfigStoreEntry {
                        name,
                        file: entry.file,
                        value_type: entry.value_type.filter(|t| !t.is_empty()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            identity,
            source: raw.source,
            libraries: raw.libraries.unwrap_or_default(),
            config: raw.config,
            tag: raw.tag.filter(|t| !t.is_empty()),
            config_store,
        }
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────

//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod invocations;
pub mod readiness;
pub mod settings;

pub use config::{
    AgentConfig, AgentConfigRef, ConfigDefaults, ConfigStoreEntry, PlatformConfig, ServiceConfig,
};
pub use error::{ConfigError, EnvironmentError, ExternalProcessError, ReadinessError};
pub use readiness::{PlatformState, ReadyPolicy};
pub use settings::{BootstrapSettings, Toolchain};

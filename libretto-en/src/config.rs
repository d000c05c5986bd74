//! Configuration resolution for libretto-en
//!
//! Settings resolve with CLI → ENV → TOML → built-in default priority.
//! The source table lives in the TOML file; requests may override it per
//! call.

use crate::types::SourceConfig;
use libretto_common::config::{load_toml_config, resolve_config_path, EnsembleDefaults, TomlConfig};
use libretto_common::{Error, Result};
use std::path::Path;
use tracing::{info, warn};

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 5741;

/// Environment variable overriding the listen port
pub const PORT_ENV_VAR: &str = "LIBRETTO_EN_PORT";

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HTTP listen port
    pub port: u16,
    /// Ensemble request defaults (top-k, timeout, failure policy)
    pub defaults: EnsembleDefaults,
    /// Configured scoring sources, in declaration order
    pub sources: Vec<SourceConfig>,
}

impl ServiceConfig {
    /// Resolve configuration from CLI arguments, environment, and TOML
    pub fn resolve(cli_config: Option<&Path>, cli_port: Option<u16>) -> Result<Self> {
        let toml_config = match resolve_config_path(cli_config, "libretto-en") {
            Some(path) => {
                info!(path = %path.display(), "Loading config file");
                load_toml_config(&path)?
            }
            None => {
                info!("No config file found, using built-in defaults");
                TomlConfig::default()
            }
        };

        let port = resolve_port(cli_port, &toml_config)?;

        let sources = toml_config
            .sources
            .iter()
            .map(|entry| SourceConfig {
                name: entry.name.clone(),
                endpoint: entry.endpoint.clone(),
                weight: entry.weight,
            })
            .collect();

        Ok(Self {
            port,
            defaults: toml_config.ensemble,
            sources,
        })
    }
}

/// Port resolution: CLI → ENV → TOML → default
fn resolve_port(cli_port: Option<u16>, toml_config: &TomlConfig) -> Result<u16> {
    let env_port = match std::env::var(PORT_ENV_VAR) {
        Ok(value) => Some(value.parse::<u16>().map_err(|_| {
            Error::Config(format!("{} is not a valid port: {}", PORT_ENV_VAR, value))
        })?),
        Err(_) => None,
    };

    let mut set_by = Vec::new();
    if cli_port.is_some() {
        set_by.push("command line");
    }
    if env_port.is_some() {
        set_by.push("environment");
    }
    if toml_config.port.is_some() {
        set_by.push("TOML");
    }
    if set_by.len() > 1 {
        warn!(
            "Port set in multiple sources: {}. Using {} (highest priority).",
            set_by.join(", "),
            set_by[0]
        );
    }

    Ok(cli_port
        .or(env_port)
        .or(toml_config.port)
        .unwrap_or(DEFAULT_PORT))
}

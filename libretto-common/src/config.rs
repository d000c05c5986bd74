//! Configuration loading and config file resolution
//!
//! Configuration is resolved with the following priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`LIBRETTO_CONFIG`)
//! 3. Platform default path (`~/.config/libretto/<service>.toml`)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "LIBRETTO_CONFIG";

/// TOML configuration file contents
///
/// All fields are optional or defaulted so that a partial (or absent) config
/// file still yields a runnable service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// HTTP listen port (overridable via `LIBRETTO_EN_PORT` / `--port`)
    pub port: Option<u16>,

    /// Ensemble request defaults
    #[serde(default)]
    pub ensemble: EnsembleDefaults,

    /// Configured scoring sources
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceEntry>,
}

/// Per-request defaults for the ensemble pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleDefaults {
    /// Candidates requested from each source
    #[serde(default = "default_top_k_per_source")]
    pub top_k_per_source: usize,

    /// Items in the final ranked output
    #[serde(default = "default_top_k_final")]
    pub top_k_final: usize,

    /// Per-source call timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Abort the whole aggregation on the first source error
    #[serde(default = "default_fail_fast")]
    pub fail_fast: bool,
}

fn default_top_k_per_source() -> usize {
    20
}

fn default_top_k_final() -> usize {
    10
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_fail_fast() -> bool {
    true
}

impl Default for EnsembleDefaults {
    fn default() -> Self {
        Self {
            top_k_per_source: default_top_k_per_source(),
            top_k_final: default_top_k_final(),
            timeout_seconds: default_timeout_seconds(),
            fail_fast: default_fail_fast(),
        }
    }
}

/// One scoring source in the config file
///
/// ```toml
/// [[source]]
/// name = "bert_en"
/// endpoint = "https://models.example.net/recommend/bert_en"
/// weight = 0.5
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Unique source name, used for weights and provenance
    pub name: String,
    /// POST endpoint implementing the scoring contract
    pub endpoint: String,
    /// Aggregation weight; omitted weights resolve per the ensemble rules
    pub weight: Option<f64>,
}

/// Resolve the config file path for a service
///
/// Priority: CLI argument, then `LIBRETTO_CONFIG`, then the platform default.
/// Returns `None` when no candidate path exists on disk (the service then
/// runs on built-in defaults).
pub fn resolve_config_path(cli_arg: Option<&Path>, service_name: &str) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    let default = default_config_path(service_name)?;
    if default.exists() {
        Some(default)
    } else {
        None
    }
}

/// Platform default config path: `~/.config/libretto/<service>.toml`
pub fn default_config_path(service_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("libretto").join(format!("{}.toml", service_name)))
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

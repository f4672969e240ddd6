//! Configuration loading and management.
//!
//! The configuration fixes everything that must be known at startup: the
//! command prefix, the engine search order, the permission rosters, the
//! role-name mapping engines render into denial templates, and where the
//! alias table persists. Engine order is read once and never changes for
//! the process lifetime.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Command prefix; lines not starting with it are ignored entirely.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Engine names in search-priority order. Fixed at startup.
    #[serde(default = "default_engines")]
    pub engines: Vec<String>,
    /// Permission rosters.
    #[serde(default)]
    pub permissions: PermissionsConfig,
    /// Engine role key to concrete role name on the home server.
    #[serde(default)]
    pub roles: HashMap<String, String>,
    /// Alias persistence.
    #[serde(default)]
    pub aliases: AliasConfig,
}

/// Permission rosters: a single ordered list of tiers below the owner.
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionsConfig {
    /// Author id of the owner (level 0).
    pub owner: Option<String>,
    /// Ordered tiers; index 0 is level 1, index 1 is level 2, and so on.
    #[serde(default)]
    pub levels: Vec<Vec<String>>,
    /// Level assigned to authors in no roster. Omit to treat unknown
    /// authors as not present on the home server at all.
    #[serde(default = "default_stranger_level")]
    pub stranger_level: Option<u8>,
    /// Role rosters for deployments without a live role lookup.
    #[serde(default)]
    pub roles: HashMap<String, Vec<String>>,
}

/// Alias persistence settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AliasConfig {
    /// JSON file the alias table persists to. Omit for in-memory only.
    pub path: Option<String>,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            owner: None,
            levels: Vec::new(),
            stranger_level: default_stranger_level(),
            roles: HashMap::new(),
        }
    }
}

fn default_prefix() -> String {
    ">".to_string()
}

fn default_engines() -> Vec<String> {
    ["admin", "mod", "util", "public"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_stranger_level() -> Option<u8> {
    Some(5)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            engines: default_engines(),
            permissions: PermissionsConfig::default(),
            roles: HashMap::new(),
            aliases: AliasConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// The concrete role name an engine's role key maps to.
    pub fn role_name(&self, key: &str) -> Option<&str> {
        self.roles.get(key).map(String::as_str)
    }
}

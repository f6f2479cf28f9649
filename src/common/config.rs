//! Configuration file handling

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// HTTP collaborator settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Scenario defaults
    #[serde(default)]
    pub scenarios: ScenarioDefaults,
}

/// HTTP collaborator settings
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Base URL request paths are joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            headers: BTreeMap::new(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Scenario defaults
#[derive(Debug, Deserialize)]
pub struct ScenarioDefaults {
    /// Wrap scenarios in a transactional scope unless they say otherwise
    #[serde(default)]
    pub transactional: bool,

    /// Colorize console reports
    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for ScenarioDefaults {
    fn default() -> Self {
        Self {
            transactional: false,
            color: default_color(),
        }
    }
}

fn default_color() -> bool {
    true
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}

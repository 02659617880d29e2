//! CLI configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Config file names searched for, in order, from the working directory up.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["caching-proxy.toml", ".caching-proxy.toml", "caching-proxy.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Listener and origin configuration.
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Cache storage configuration.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(path, &content)
    }

    /// Parse config text; `.json` paths are JSON, anything else TOML.
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render config as TOML")
    }
}

/// Proxy listener and origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Host to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origin base URL, e.g. `http://dummyjson.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            origin: None,
        }
    }
}

/// Cache storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory, relative to the working directory unless absolute.
    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

fn default_cache_dir() -> String {
    "./tmp/cache".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

/// Generate a default caching-proxy.toml config file.
pub fn generate_default_config() -> String {
    r#"# Caching proxy configuration

[proxy]
host = "localhost"
port = 8080
# origin = "http://dummyjson.com"

[cache]
dir = "./tmp/cache"
"#
    .to_string()
}

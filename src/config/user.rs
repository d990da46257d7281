//! User configuration.
//!
//! Stored at `~/.config/reqpin/config.toml` and contains:
//! - the package index URL used by `outdated`
//! - an optional bearer token for private indexes
//! - default lookup concurrency

use std::path::PathBuf;

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use super::ConfigError;

const CONFIG_DIR: &str = "reqpin";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// JSON API root of the package index (default: https://pypi.org/pypi).
    #[serde(default = "default_index_url")]
    pub index_url: String,

    /// Bearer token for authenticated indexes.
    #[serde(default)]
    pub index_token: Option<String>,

    /// Number of packages looked up concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_index_url() -> String {
    "https://pypi.org/pypi".to_string()
}

fn default_concurrency() -> usize {
    8
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            index_token: None,
            concurrency: default_concurrency(),
        }
    }
}

impl UserConfig {
    /// Load config from the default location.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&path, content).context("Failed to write config file")
    }

    /// Get the index token as a SecretString.
    pub fn index_token_secret(&self) -> Option<SecretString> {
        self.index_token
            .clone()
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
    }

    pub fn has_index_token(&self) -> bool {
        self.index_token
            .as_ref()
            .map(|t| !t.is_empty())
            .unwrap_or(false)
    }

    /// Set the index URL after checking it is an absolute http(s) URL.
    pub fn set_index_url(&mut self, url: &str) -> Result<(), ConfigError> {
        self.index_url = validate_index_url(url)?;
        Ok(())
    }

    pub fn set_index_token(&mut self, token: String) {
        self.index_token = Some(token);
    }

    pub fn set_concurrency(&mut self, concurrency: usize) -> Result<(), ConfigError> {
        if concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        self.concurrency = concurrency;
        Ok(())
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }
}

/// Validate an index URL, returning it without a trailing slash.
pub fn validate_index_url(url: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidIndexUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("query strings and fragments are not allowed"));
    }

    Ok(url.trim_end_matches('/').to_string())
}

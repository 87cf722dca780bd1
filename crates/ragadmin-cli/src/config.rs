//! Configuration management for the ragadmin CLI
//!
//! Settings are layered: built-in defaults, then `config.toml` in the user
//! config directory, then `RAGADMIN_*` environment variables, then command-line
//! flags (applied by the caller).

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// CLI Configuration Constants
// ============================================================================

/// Default backend URL when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:9380";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default query cache stale time in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Keys accepted by `ragadmin config get/set`
pub const CONFIG_KEYS: &[&str] = &[
    "server_url",
    "token",
    "timeout_secs",
    "cache_ttl_secs",
    "export_dir",
];

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Backend URL
    pub server_url: String,

    /// Bearer token passed through verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// How long a cached query stays fresh
    pub cache_ttl_secs: u64,

    /// Where exports are written
    pub export_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            export_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Path of the user config file
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("RAGADMIN_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        Ok(dirs::config_dir()
            .ok_or_else(|| CliError::config("Could not determine config directory"))?
            .join("ragadmin")
            .join("config.toml"))
    }

    /// Defaults, overlaid with the user config file and environment
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)?.merge_env()
    }

    /// Read a config file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Overlay `RAGADMIN_*` environment variables
    pub fn merge_env(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var("RAGADMIN_SERVER_URL") {
            self.server_url = url;
        }

        if let Ok(token) = std::env::var("RAGADMIN_TOKEN") {
            self.token = Some(token);
        }

        if let Ok(secs) = std::env::var("RAGADMIN_API_TIMEOUT_SECS") {
            self.timeout_secs = parse_secs("RAGADMIN_API_TIMEOUT_SECS", &secs)?;
        }

        if let Ok(secs) = std::env::var("RAGADMIN_CACHE_TTL_SECS") {
            self.cache_ttl_secs = parse_secs("RAGADMIN_CACHE_TTL_SECS", &secs)?;
        }

        if let Ok(dir) = std::env::var("RAGADMIN_EXPORT_DIR") {
            self.export_dir = PathBuf::from(dir);
        }

        Ok(self)
    }

    /// Write the config file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Read one setting by key
    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "server_url" => Ok(self.server_url.clone()),
            "token" => Ok(self.token.as_ref().map(|_| "***".to_string()).unwrap_or_default()),
            "timeout_secs" => Ok(self.timeout_secs.to_string()),
            "cache_ttl_secs" => Ok(self.cache_ttl_secs.to_string()),
            "export_dir" => Ok(self.export_dir.display().to_string()),
            _ => Err(unknown_key(key)),
        }
    }

    /// Change one setting by key, validating the value
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server_url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(CliError::config(format!(
                        "server_url must start with http:// or https://, got '{}'",
                        value
                    )));
                }
                self.server_url = value.trim_end_matches('/').to_string();
            },
            "token" => self.token = Some(value.to_string()).filter(|t| !t.is_empty()),
            "timeout_secs" => self.timeout_secs = parse_secs(key, value)?,
            "cache_ttl_secs" => self.cache_ttl_secs = parse_secs(key, value)?,
            "export_dir" => self.export_dir = PathBuf::from(value),
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::config(format!("{} must be a whole number of seconds, got '{}'", key, value)))
}

fn unknown_key(key: &str) -> CliError {
    CliError::config(format!(
        "Unknown config key: {}. Valid keys: {}",
        key,
        CONFIG_KEYS.join(", ")
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ragadmin").join("config.toml");

        let mut config = Config::default();
        config.set("server_url", "https://admin.example.com/").unwrap();
        config.set("cache_ttl_secs", "60").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server_url, "https://admin.example.com");
        assert_eq!(loaded.cache_ttl_secs, 60);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "timeout_secs = 5\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("server_url", "ftp://x").is_err());
        assert!(config.set("timeout_secs", "soon").is_err());
        assert!(config.set("colour", "blue").is_err());
    }

    #[test]
    fn test_token_is_masked() {
        let mut config = Config::default();
        config.set("token", "abc").unwrap();
        assert_eq!(config.get("token").unwrap(), "***");
    }
}

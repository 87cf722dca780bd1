//! `ragadmin config` command implementation
//!
//! Reads and writes the user config file.

use crate::config::{Config, CONFIG_KEYS};
use crate::error::Result;
use colored::Colorize;
use std::path::Path;

/// Print one resolved configuration value
pub async fn get(key: String) -> Result<()> {
    let config = Config::load()?;
    println!("{}", config.get(&key)?);
    Ok(())
}

/// Persist one value to the config file
pub async fn set(key: String, value: String) -> Result<()> {
    let path = Config::default_path()?;
    set_in(&path, &key, &value)?;
    println!("{} Set {} in {}", "✓".green(), key.cyan(), path.display());
    Ok(())
}

fn set_in(path: &Path, key: &str, value: &str) -> Result<()> {
    // Only the file layer is rewritten; env overrides stay out of it.
    let mut config = Config::load_from(path)?;
    config.set(key, value)?;
    config.save_to(path)
}

/// Show all configuration
pub async fn show() -> Result<()> {
    let config = Config::load()?;
    let path = Config::default_path()?;

    println!("{}", "ragadmin Configuration:".cyan().bold());
    println!();
    for key in CONFIG_KEYS {
        println!("{:<16} {}", format!("{}:", key), config.get(key)?);
    }
    println!();
    println!("{} {}", "Config file:".cyan(), path.display());
    println!("{}", "Environment Variables:".cyan());
    println!("  RAGADMIN_SERVER_URL        - Backend URL");
    println!("  RAGADMIN_TOKEN             - Bearer token");
    println!("  RAGADMIN_API_TIMEOUT_SECS  - Request timeout");
    println!("  RAGADMIN_CACHE_TTL_SECS    - Query cache stale time");
    println!("  RAGADMIN_EXPORT_DIR        - Default export directory");

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_in_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        set_in(&path, "timeout_secs", "12").unwrap();
        set_in(&path, "server_url", "http://admin.local:9380").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.timeout_secs, 12);
        assert_eq!(config.server_url, "http://admin.local:9380");
    }

    #[test]
    fn test_set_in_rejects_unknown_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        assert!(set_in(&path, "verbose", "true").is_err());
        assert!(!path.exists());
    }
}

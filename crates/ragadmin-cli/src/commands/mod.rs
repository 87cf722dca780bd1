//! CLI command implementations
//!
//! Each command group has its own module. [`Context`] carries the resolved
//! configuration, the API client and the shared query cache.

pub mod config;
pub mod dashboard;
pub mod health;
pub mod models;
pub mod roles;
pub mod users;
pub mod versions;

use crate::api::{AdminApi, ApiClient};
use crate::cache::QueryCache;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::poll::ViewState;
use colored::Colorize;
use inquire::{Confirm, InquireError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Everything a command needs to talk to the backend
pub struct Context {
    pub config: Config,
    pub api: Arc<dyn AdminApi>,
    pub cache: QueryCache,
}

impl Context {
    /// Load config, then apply command-line overrides
    pub fn load(server_url: Option<&str>, token: Option<&str>) -> Result<Self> {
        let mut config = Config::load()?;
        if let Some(url) = server_url {
            config.set("server_url", url)?;
        }
        if let Some(token) = token {
            config.token = Some(token.to_string()).filter(|t| !t.is_empty());
        }
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        debug!(server_url = %config.server_url, "Using backend");
        let api: Arc<dyn AdminApi> = Arc::new(ApiClient::from_config(&config)?);
        let cache = QueryCache::new(Duration::from_secs(config.cache_ttl_secs));
        Ok(Self { config, api, cache })
    }
}

/// Ask before a destructive action unless `--yes` was given
///
/// `None` means the user declined and the command should stop quietly.
/// Without a terminal the answer is `Some(false)`, so the workflow reports
/// that confirmation is required.
pub fn confirm(prompt: &str, yes: bool) -> Result<Option<bool>> {
    if yes {
        return Ok(Some(true));
    }
    match Confirm::new(prompt).with_default(false).prompt() {
        Ok(true) => Ok(Some(true)),
        Ok(false) => {
            println!("Cancelled.");
            Ok(None)
        },
        Err(InquireError::NotTTY) => Ok(Some(false)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            println!("Cancelled.");
            Ok(None)
        },
        Err(e) => Err(e.into()),
    }
}

/// Use the given password or prompt for one with confirmation
///
/// Returns `(password, confirmation)`.
pub fn password_input(given: Option<String>) -> Result<(String, String)> {
    if let Some(password) = given {
        return Ok((password.clone(), password));
    }
    let password = inquire::Password::new("Password:")
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .with_custom_confirmation_message("Confirm password:")
        .with_custom_confirmation_error_message("Passwords do not match")
        .prompt()
        .map_err(|e| match e {
            InquireError::NotTTY => CliError::validation(
                "password",
                "No terminal to prompt on; pass --password",
            ),
            other => other.into(),
        })?;
    Ok((password.clone(), password))
}

pub fn success(message: impl std::fmt::Display) {
    println!("{} {}", "✓".green(), message);
}

pub fn warning(message: impl std::fmt::Display) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

/// Print each settled [`ViewState`] until Ctrl-C, then stop the poller
pub async fn watch_until_interrupted<T, R>(
    mut states: watch::Receiver<ViewState<T>>,
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
    mut render: R,
) -> Result<()>
where
    T: Clone,
    R: FnMut(&T) -> Result<()>,
{
    println!("{}", "Watching for changes, press Ctrl-C to stop.".dimmed());
    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                match state {
                    ViewState::Loading => {},
                    ViewState::Failed(e) => warning(format!("Refresh failed: {}", e)),
                    ViewState::Ready { refreshing: true, .. } => {},
                    ViewState::Ready { data, last_error, .. } => {
                        println!();
                        println!(
                            "{}",
                            format!("Updated {}", chrono::Local::now().format("%H:%M:%S")).dimmed()
                        );
                        render(&data)?;
                        if let Some(e) = last_error {
                            warning(format!("Showing last good data; refresh failed: {}", e));
                        }
                    },
                }
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted, stopping poller");
                break;
            }
        }
    }

    let _ = shutdown.send(true);
    handle
        .await
        .map_err(|e| CliError::Other(anyhow::anyhow!("poller task failed: {}", e)))?;
    Ok(())
}

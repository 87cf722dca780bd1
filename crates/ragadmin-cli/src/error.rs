//! Error types for the ragadmin CLI
//!
//! Every variant renders as a single user-facing notification line. Backend
//! rejections carry the message from the response body; client-side checks
//! never reach the network.

use ragadmin_common::CommonError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Error taxonomy for console operations
#[derive(Error, Debug)]
pub enum CliError {
    /// Client-side field check failed; no request was issued
    #[error("Invalid input: {0}")]
    Validation(#[from] CommonError),

    /// Backend rejected the request because the resource already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backend reported the resource as missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other backend rejection
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The request never completed
    #[error("Network request failed: {0}. Check your connection and server URL (ragadmin health).")]
    Network(String),

    /// A workflow precondition failed before any request was sent
    #[error("Not allowed: {0}")]
    Precondition(String),

    /// A destructive action was issued without explicit confirmation
    #[error("{0} is irreversible and requires confirmation. Re-run with --yes or answer the prompt.")]
    ConfirmationRequired(String),

    /// The same mutation is already in flight
    #[error("'{0}' is already in progress")]
    Busy(String),

    /// Some calls of a bulk action failed; successful ones are not rolled back
    #[error("Failed to {action} {failed} of {total} user(s): {details}")]
    BulkPartial {
        action: String,
        failed: usize,
        total: usize,
        details: String,
    },

    /// Polling gave up before the job reached a terminal state
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your config file or RAGADMIN_* environment variables.")]
    Config(String),

    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("CSV file error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to parse config file: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to write config file: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] inquire::InquireError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for CliError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return CliError::from_status(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return CliError::Server {
                status: 200,
                message: format!("Unexpected response body: {}", err),
            };
        }
        CliError::Network(err.to_string())
    }
}

impl CliError {
    /// Map a backend status (HTTP or envelope code) and message to a variant
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => CliError::NotFound(message),
            409 => CliError::Conflict(message),
            _ if looks_like_conflict(&message) => CliError::Conflict(message),
            _ => CliError::Server { status, message },
        }
    }

    /// Create a validation error for a single field
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(CommonError::invalid_field(field, message))
    }

    /// Create a precondition error
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True when the error was produced before any request went out
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            CliError::Validation(_)
                | CliError::Precondition(_)
                | CliError::ConfirmationRequired(_)
                | CliError::Busy(_)
        )
    }
}

// The backend answers duplicate registrations with a generic 400 and a
// message such as "User 'a@x.com' already exists".
fn looks_like_conflict(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("already exist") || lower.contains("duplicate")
}

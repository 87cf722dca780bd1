//! ragadmin CLI Library
//!
//! Administrative console for a RAG platform backend.
//!
//! # Overview
//!
//! The backend owns every entity; this crate is its client side:
//!
//! - **Users**: list, filter, create, switch on/off, reset passwords, delete,
//!   change roles, bulk actions, CSV import and CSV/JSON export
//!   (`ragadmin users ...`)
//! - **Roles**: custom roles and their per-resource permissions
//!   (`ragadmin roles ...`)
//! - **Models**: registry CRUD, benchmark runs and comparison
//!   (`ragadmin models ...`)
//! - **Versions**: per-model version history with activate and rollback
//!   (`ragadmin versions ...`)
//! - **Dashboard**: platform metrics and recent activity (`ragadmin dashboard`)
//! - **Configuration**: manage CLI settings (`ragadmin config`)
//!
//! Reads go through a time-bounded [`cache::QueryCache`]; every mutation
//! invalidates the query keys it affects.

pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod poll;
pub mod progress;
pub mod render;
pub mod workflow;

// Re-export commonly used types
pub use error::{CliError, Result};

use crate::api::{ModelStatus, ModelType, PermissionAction, TestType, DEFAULT_USER_ROLE};
use crate::export::ExportFormat;
use crate::workflow::users::{BulkAction, RoleFilter, StatusFilter};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ragadmin - RAG platform admin console
#[derive(Parser, Debug)]
#[command(name = "ragadmin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Backend URL (overrides the config file)
    #[arg(long, env = "RAGADMIN_SERVER_URL", global = true)]
    pub server_url: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, env = "RAGADMIN_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Print the CLI reference as Markdown and exit
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage platform users
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },

    /// Manage roles and permissions
    Roles {
        #[command(subcommand)]
        command: RolesCommand,
    },

    /// Manage registered models and benchmarks
    Models {
        #[command(subcommand)]
        command: ModelsCommand,
    },

    /// Manage model version history
    Versions {
        #[command(subcommand)]
        command: VersionsCommand,
    },

    /// Show platform metrics and recent activity
    Dashboard {
        /// Keep refreshing every 30 seconds until Ctrl-C
        #[arg(short, long)]
        watch: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Check that the backend is reachable
    Health,
}

/// How list commands print their rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}. Valid formats: table, json", s)),
        }
    }
}

/// Filters shared by `users list` and `users export`
#[derive(Args, Debug, Clone, Default)]
pub struct UserFilterArgs {
    /// Match email or nickname (case-insensitive)
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only this role (admin, user)
    #[arg(long)]
    pub role: Option<RoleFilter>,

    /// Only this status (active, inactive)
    #[arg(long)]
    pub status: Option<StatusFilter>,

    /// Created on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Created on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,
}

/// User management subcommands
#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List users
    List {
        #[command(flatten)]
        filter: UserFilterArgs,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// Keep refreshing every 10 seconds until Ctrl-C
        #[arg(short, long)]
        watch: bool,
    },

    /// Show one user
    Show {
        email: String,
    },

    /// Create a user
    Create {
        email: String,

        /// Password (prompted with confirmation if omitted)
        #[arg(long)]
        password: Option<String>,

        /// Role to create the user with
        #[arg(long, default_value = DEFAULT_USER_ROLE)]
        role: String,
    },

    /// Move a user to another role
    SetRole {
        email: String,

        /// Role name, e.g. admin, user, viewer or a custom role
        role: String,
    },

    /// Create users from a CSV file with Email,Password,Role columns
    Import {
        /// CSV file to read
        file: PathBuf,
    },

    /// Allow a user to sign in
    Activate {
        email: String,
    },

    /// Block a user from signing in
    Deactivate {
        email: String,
    },

    /// Replace a user's password
    Password {
        email: String,

        /// New password (prompted with confirmation if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Delete a user
    Delete {
        email: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Apply one action to several users
    Bulk {
        /// activate, deactivate or delete
        action: BulkAction,

        /// Users to act on
        #[arg(required = true)]
        emails: Vec<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Export users to a CSV or JSON file
    Export {
        /// File format (csv, json)
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,

        /// Export only these users (repeatable); defaults to every listed user
        #[arg(long = "select", value_name = "EMAIL")]
        select: Vec<String>,

        #[command(flatten)]
        filter: UserFilterArgs,

        /// Directory to write into (defaults to the configured export_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

/// Role subcommands
#[derive(Subcommand, Debug)]
pub enum RolesCommand {
    /// List roles
    List {
        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Create a role
    Create {
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Change a role's description
    Update {
        name: String,

        #[arg(short, long)]
        description: String,
    },

    /// Delete a custom role
    Delete {
        name: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List the resource types permissions apply to
    Resources,

    /// Show a role's permissions per resource type
    Permissions {
        name: String,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Allow actions on a resource type
    Grant {
        name: String,

        /// Resource type, e.g. dataset
        #[arg(short, long)]
        resource: String,

        /// Comma-separated: enable, read, write, share
        #[arg(short, long, value_delimiter = ',', required = true)]
        actions: Vec<PermissionAction>,
    },

    /// Withdraw actions on a resource type
    Revoke {
        name: String,

        /// Resource type, e.g. dataset
        #[arg(short, long)]
        resource: String,

        /// Comma-separated: enable, read, write, share
        #[arg(short, long, value_delimiter = ',', required = true)]
        actions: Vec<PermissionAction>,
    },
}

/// Model registry subcommands
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// List registered models
    List {
        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one model
    Show {
        id: String,
    },

    /// Register a model
    Register {
        /// Display name
        #[arg(long)]
        name: String,

        /// chat, embedding, rerank or image
        #[arg(long = "type")]
        model_type: ModelType,

        /// Provider (Ollama, OpenAI, Azure, HuggingFace, ...)
        #[arg(long)]
        factory: String,

        /// Provider endpoint
        #[arg(long)]
        api_base: Option<String>,

        /// Provider API key (never printed)
        #[arg(long, env = "RAGADMIN_MODEL_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Change a model's definition; unset flags keep their current value
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type")]
        model_type: Option<ModelType>,

        #[arg(long)]
        factory: Option<String>,

        #[arg(long)]
        api_base: Option<String>,

        #[arg(long, hide_env_values = true)]
        api_key: Option<String>,

        /// active or inactive
        #[arg(long)]
        status: Option<ModelStatus>,
    },

    /// Delete a model
    Delete {
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Run and inspect benchmarks
    Benchmark {
        #[command(subcommand)]
        command: BenchmarkCommand,
    },

    /// Compare the latest benchmark figures of several models
    Compare {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

/// Benchmark subcommands
#[derive(Subcommand, Debug)]
pub enum BenchmarkCommand {
    /// Start a benchmark run
    Run {
        /// Model ID
        id: String,

        /// latency, quality or throughput
        #[arg(long = "type")]
        test_type: TestType,

        /// Poll until the run completes or fails
        #[arg(short, long)]
        wait: bool,

        /// Give up waiting after this many polls
        #[arg(long, default_value_t = workflow::models::DEFAULT_MAX_POLLS)]
        max_polls: u32,
    },

    /// List benchmark runs
    List {
        /// Only runs of this model
        #[arg(short, long)]
        model: Option<String>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// Keep refreshing every 5 seconds until Ctrl-C
        #[arg(short, long)]
        watch: bool,
    },
}

/// Version subcommands
#[derive(Subcommand, Debug)]
pub enum VersionsCommand {
    /// Show a model's version history
    List {
        /// Model ID
        model: String,
    },

    /// Append a version (starts inactive)
    Create {
        /// Model ID
        model: String,

        /// Version label, e.g. 1.2.0
        #[arg(long)]
        version: String,

        #[arg(short, long)]
        description: String,

        /// Author (defaults to "admin")
        #[arg(long)]
        created_by: Option<String>,
    },

    /// Make one version the active one
    Activate {
        /// Model ID
        model: String,

        /// Version ID from `versions list`
        version_id: i64,
    },

    /// Re-activate the version before the active one
    Rollback {
        /// Model ID
        model: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Get configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Set configuration value
    Set {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },

    /// Show all configuration
    Show,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bulk_and_export() {
        let cli = Cli::try_parse_from([
            "ragadmin", "users", "bulk", "delete", "a@x.com", "b@x.com", "--yes",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Users {
                command: UsersCommand::Bulk { action, emails, yes },
            }) => {
                assert_eq!(action, BulkAction::Delete);
                assert_eq!(emails.len(), 2);
                assert!(yes);
            },
            other => panic!("unexpected parse: {:?}", other),
        }

        let cli = Cli::try_parse_from([
            "ragadmin", "users", "export", "--format", "json", "--select", "a@x.com", "--role", "admin",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Users {
                command: UsersCommand::Export { format: ExportFormat::Json, .. }
            })
        ));
    }

    #[test]
    fn test_parse_role_grant_and_default_user_role() {
        let cli = Cli::try_parse_from([
            "ragadmin", "roles", "grant", "editor", "--resource", "dataset", "--actions", "read,write",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Roles {
                command: RolesCommand::Grant { name, resource, actions },
            }) => {
                assert_eq!(name, "editor");
                assert_eq!(resource, "dataset");
                assert_eq!(actions, vec![PermissionAction::Read, PermissionAction::Write]);
            },
            other => panic!("unexpected parse: {:?}", other),
        }

        let cli = Cli::try_parse_from(["ragadmin", "users", "create", "a@x.com"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Users {
                command: UsersCommand::Create { ref role, .. }
            }) if role == "user"
        ));

        assert!(Cli::try_parse_from([
            "ragadmin", "roles", "revoke", "editor", "-r", "dataset", "-a", "fly",
        ])
        .is_err());
    }

    #[test]
    fn test_rejects_unknown_test_type() {
        let parsed = Cli::try_parse_from([
            "ragadmin", "models", "benchmark", "run", "m1", "--type", "speed",
        ]);
        assert!(parsed.is_err());
    }
}

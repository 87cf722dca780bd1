//! ragadmin CLI - Main entry point

use clap::{CommandFactory, Parser};
use ragadmin_cli::commands::{self, models::ModelChanges, Context};
use ragadmin_cli::{
    BenchmarkCommand, Cli, Commands, ConfigCommand, ModelsCommand, RolesCommand, UsersCommand,
    VersionsCommand,
};
use ragadmin_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // A local .env may carry RAGADMIN_* settings
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    let Some(ref command) = cli.command else {
        let _ = Cli::command().print_help();
        process::exit(2);
    };

    // Logs go to stderr so command output stays pipeable
    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn })
        .output(LogOutput::Console)
        .log_file_prefix("ragadmin")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _ = init_logging(&log_config);

    if let Err(e) = execute_command(&cli, command).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, command: &Commands) -> ragadmin_cli::Result<()> {
    // Config commands work without a reachable backend
    if let Commands::Config { command } = command {
        return match command {
            ConfigCommand::Get { key } => commands::config::get(key.clone()).await,
            ConfigCommand::Set { key, value } => {
                commands::config::set(key.clone(), value.clone()).await
            },
            ConfigCommand::Show => commands::config::show().await,
        };
    }

    let ctx = Context::load(cli.server_url.as_deref(), cli.token.as_deref())?;

    match command {
        Commands::Users { command } => match command {
            UsersCommand::List {
                filter,
                format,
                watch,
            } => commands::users::list(&ctx, filter, *format, *watch).await,
            UsersCommand::Show { email } => commands::users::show(&ctx, email).await,
            UsersCommand::Create {
                email,
                password,
                role,
            } => commands::users::create(&ctx, email, password.clone(), role).await,
            UsersCommand::SetRole { email, role } => {
                commands::users::set_role(&ctx, email, role).await
            },
            UsersCommand::Import { file } => commands::users::import(&ctx, file).await,
            UsersCommand::Activate { email } => {
                commands::users::set_status(&ctx, email, true).await
            },
            UsersCommand::Deactivate { email } => {
                commands::users::set_status(&ctx, email, false).await
            },
            UsersCommand::Password { email, password } => {
                commands::users::set_password(&ctx, email, password.clone()).await
            },
            UsersCommand::Delete { email, yes } => {
                commands::users::delete(&ctx, email, *yes).await
            },
            UsersCommand::Bulk {
                action,
                emails,
                yes,
            } => commands::users::bulk(&ctx, *action, emails, *yes).await,
            UsersCommand::Export {
                format,
                select,
                filter,
                output_dir,
            } => {
                commands::users::export(&ctx, *format, select, filter, output_dir.clone()).await
            },
        },

        Commands::Roles { command } => match command {
            RolesCommand::List { format } => commands::roles::list(&ctx, *format).await,
            RolesCommand::Create { name, description } => {
                commands::roles::create(&ctx, name, description).await
            },
            RolesCommand::Update { name, description } => {
                commands::roles::update(&ctx, name, description).await
            },
            RolesCommand::Delete { name, yes } => commands::roles::delete(&ctx, name, *yes).await,
            RolesCommand::Resources => commands::roles::resources(&ctx).await,
            RolesCommand::Permissions { name, format } => {
                commands::roles::permissions(&ctx, name, *format).await
            },
            RolesCommand::Grant {
                name,
                resource,
                actions,
            } => commands::roles::grant(&ctx, name, resource, actions).await,
            RolesCommand::Revoke {
                name,
                resource,
                actions,
            } => commands::roles::revoke(&ctx, name, resource, actions).await,
        },

        Commands::Models { command } => match command {
            ModelsCommand::List { format } => commands::models::list(&ctx, *format).await,
            ModelsCommand::Show { id } => commands::models::show(&ctx, id).await,
            ModelsCommand::Register {
                name,
                model_type,
                factory,
                api_base,
                api_key,
            } => {
                commands::models::register(
                    &ctx,
                    name.clone(),
                    *model_type,
                    factory.clone(),
                    api_base.clone(),
                    api_key.clone(),
                )
                .await
            },
            ModelsCommand::Update {
                id,
                name,
                model_type,
                factory,
                api_base,
                api_key,
                status,
            } => {
                let changes = ModelChanges {
                    name: name.clone(),
                    model_type: *model_type,
                    factory: factory.clone(),
                    api_base: api_base.clone(),
                    api_key: api_key.clone(),
                    status: *status,
                };
                commands::models::update(&ctx, id, changes).await
            },
            ModelsCommand::Delete { id, yes } => commands::models::delete(&ctx, id, *yes).await,
            ModelsCommand::Benchmark { command } => match command {
                BenchmarkCommand::Run {
                    id,
                    test_type,
                    wait,
                    max_polls,
                } => {
                    commands::models::run_benchmark(&ctx, id, *test_type, *wait, *max_polls)
                        .await
                },
                BenchmarkCommand::List {
                    model,
                    format,
                    watch,
                } => commands::models::list_benchmarks(&ctx, model.clone(), *format, *watch).await,
            },
            ModelsCommand::Compare { ids } => commands::models::compare(&ctx, ids).await,
        },

        Commands::Versions { command } => match command {
            VersionsCommand::List { model } => commands::versions::list(&ctx, model).await,
            VersionsCommand::Create {
                model,
                version,
                description,
                created_by,
            } => {
                commands::versions::create(
                    &ctx,
                    model,
                    version,
                    description,
                    created_by.as_deref(),
                )
                .await
            },
            VersionsCommand::Activate { model, version_id } => {
                commands::versions::activate(&ctx, model, *version_id).await
            },
            VersionsCommand::Rollback { model, yes } => {
                commands::versions::rollback(&ctx, model, *yes).await
            },
        },

        Commands::Dashboard { watch } => commands::dashboard::run(&ctx, *watch).await,

        Commands::Health => commands::health::run(&ctx).await,

        Commands::Config { .. } => Ok(()),
    }
}

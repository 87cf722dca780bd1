//! `ragadmin users` command implementation

use crate::cache::QueryKey;
use crate::commands::{confirm, password_input, success, warning, watch_until_interrupted, Context};
use crate::error::{CliError, Result};
use crate::export::{self, ExportFormat, ExportOutcome};
use crate::import;
use crate::poll::Poller;
use crate::progress::with_spinner;
use crate::render;
use crate::workflow::users::{UserFilter, USERS_POLL_INTERVAL};
use crate::workflow::{BulkAction, BulkReport, Dialog, Selection, UserDirectory};
use crate::{OutputFormat, UserFilterArgs};
use colored::Colorize;
use ragadmin_common::validation::parse_date;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

fn directory(ctx: &Context) -> UserDirectory {
    UserDirectory::new(Arc::clone(&ctx.api), ctx.cache.clone())
}

impl UserFilterArgs {
    /// Validate dates and build the filter
    pub fn to_filter(&self) -> Result<UserFilter> {
        Ok(UserFilter {
            search: self.search.clone(),
            role: self.role,
            status: self.status,
            from: self.from.as_deref().map(parse_date).transpose()?,
            to: self.to.as_deref().map(parse_date).transpose()?,
        })
    }
}

pub async fn list(
    ctx: &Context,
    filter: &UserFilterArgs,
    format: OutputFormat,
    watch_mode: bool,
) -> Result<()> {
    let filter = filter.to_filter()?;

    if watch_mode {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let api = Arc::clone(&ctx.api);
        let (states, handle) = Poller::new(QueryKey::Users, USERS_POLL_INTERVAL, ctx.cache.clone())
            .spawn(
                move || {
                    let api = Arc::clone(&api);
                    async move { api.list_users().await }
                },
                shutdown_rx,
            );
        return watch_until_interrupted(states, handle, shutdown_tx, |users| {
            print_users(&filter.apply(users), format)
        })
        .await;
    }

    let users = with_spinner("Loading users", directory(ctx).list()).await?;
    print_users(&filter.apply(&users), format)
}

fn print_users(users: &[crate::api::User], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(users)?),
        OutputFormat::Table => {
            if users.is_empty() {
                println!("No users found.");
                return Ok(());
            }
            println!("{}", render::users_table(users, &Selection::new()));
            println!("{} user(s)", users.len());
        },
    }
    Ok(())
}

pub async fn show(ctx: &Context, email: &str) -> Result<()> {
    let user = with_spinner("Loading user", directory(ctx).detail(email)).await?;
    println!("{}", render::user_detail_table(&user));
    Ok(())
}

/// Fields of the create-user form
#[derive(Debug, Clone, Default)]
struct NewUserForm {
    email: String,
    password: String,
    confirmation: String,
}

pub async fn create(
    ctx: &Context,
    email: &str,
    password: Option<String>,
    role: &str,
) -> Result<()> {
    // Check the email before asking for a password.
    ragadmin_common::validation::validate_email(email)?;
    let interactive = password.is_none();
    let dir = directory(ctx);
    let users = &dir;

    let mut dialog: Dialog<NewUserForm> = Dialog::new();
    dialog.open()?;
    dialog.form.email = email.to_string();
    (dialog.form.password, dialog.form.confirmation) = password_input(password)?;

    loop {
        let outcome = dialog
            .submit(|form| async move {
                users
                    .create(&form.email, &form.password, &form.confirmation, role)
                    .await?;
                Ok::<_, CliError>(form.email)
            })
            .await;

        match outcome {
            Ok(created) => {
                success(format!("Created user {}", created.cyan()));
                return Ok(());
            },
            // The form is kept after a rejection; let a person fix it in place.
            Err(e) if interactive && !matches!(e, CliError::Network(_)) => {
                warning(&e);
                if confirm("Edit and retry?", false)? != Some(true) {
                    dialog.cancel()?;
                    return Err(e);
                }
                dialog.form.email = inquire::Text::new("Email:")
                    .with_initial_value(&dialog.form.email)
                    .prompt()?;
                (dialog.form.password, dialog.form.confirmation) = password_input(None)?;
            },
            Err(e) => return Err(e),
        }
    }
}

pub async fn set_status(ctx: &Context, email: &str, active: bool) -> Result<()> {
    directory(ctx).set_status(email, active).await?;
    let verb = if active { "Activated" } else { "Deactivated" };
    success(format!("{} {}", verb, email.cyan()));
    Ok(())
}

pub async fn set_password(ctx: &Context, email: &str, password: Option<String>) -> Result<()> {
    let (password, confirmation) = password_input(password)?;
    directory(ctx).set_password(email, &password, &confirmation).await?;
    success(format!("Password changed for {}", email.cyan()));
    Ok(())
}

pub async fn set_role(ctx: &Context, email: &str, role: &str) -> Result<()> {
    directory(ctx).set_role(email, role).await?;
    success(format!("{} is now {}", email.cyan(), role.trim().bold()));
    Ok(())
}

pub async fn import(ctx: &Context, file: &Path) -> Result<()> {
    let rows = import::read_import(file)?;
    let report = with_spinner(
        &format!("Importing {} user(s)", rows.len()),
        directory(ctx).import(rows),
    )
    .await?;

    print_report(&report);
    if report.is_complete_success() {
        success(format!("Imported {} user(s)", report.succeeded.len()));
    }
    report.into_result().map(|_| ())
}

pub async fn delete(ctx: &Context, email: &str, yes: bool) -> Result<()> {
    let Some(confirmed) = confirm(&format!("Delete user {}? This cannot be undone.", email), yes)?
    else {
        return Ok(());
    };
    directory(ctx).delete(email, confirmed).await?;
    success(format!("Deleted {}", email.cyan()));
    Ok(())
}

pub async fn bulk(ctx: &Context, action: BulkAction, emails: &[String], yes: bool) -> Result<()> {
    let mut selection: Selection = emails.iter().cloned().collect();
    let prompt = format!("{} {} user(s)?", capitalize(action.as_str()), selection.len());
    let Some(confirmed) = confirm(&prompt, yes)? else {
        return Ok(());
    };

    let report = with_spinner(
        &format!("Applying {} to {} user(s)", action, selection.len()),
        directory(ctx).bulk(action, &mut selection, confirmed),
    )
    .await?;

    print_report(&report);
    if report.is_complete_success() {
        success(format!("{} applied to {} user(s)", action, report.succeeded.len()));
    } else {
        warning(format!(
            "{} user(s) still selected; re-run for those that failed",
            selection.len()
        ));
    }
    report.into_result().map(|_| ())
}

pub async fn export(
    ctx: &Context,
    format: ExportFormat,
    select: &[String],
    filter: &UserFilterArgs,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let filter = filter.to_filter()?;
    let users = with_spinner("Loading users", directory(ctx).list()).await?;
    let visible = filter.apply(&users);
    let selection: Selection = select.iter().cloned().collect();
    let dir = output_dir.unwrap_or_else(|| ctx.config.export_dir.clone());

    match export::export_users(&visible, &selection, format, &dir)? {
        ExportOutcome::Written { path, rows } => {
            success(format!("Exported {} user(s) to {}", rows, path.display()));
        },
        ExportOutcome::Empty => warning("No data to export"),
    }
    Ok(())
}

fn print_report(report: &BulkReport) {
    for email in &report.succeeded {
        println!("  {} {}", "✓".green(), email);
    }
    for (email, reason) in &report.failed {
        println!("  {} {} ({})", "✗".red(), email, reason);
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_args_reject_bad_dates() {
        let args = UserFilterArgs {
            from: Some("2024-13-01".into()),
            ..Default::default()
        };
        assert!(args.to_filter().is_err());

        let args = UserFilterArgs {
            from: Some("2024-01-01".into()),
            to: Some("2024-12-31".into()),
            ..Default::default()
        };
        let filter = args.to_filter().unwrap();
        assert!(filter.from.is_some() && filter.to.is_some());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("delete"), "Delete");
        assert_eq!(capitalize(""), "");
    }
}

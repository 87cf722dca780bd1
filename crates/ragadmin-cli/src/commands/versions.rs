//! `ragadmin versions` command implementation

use crate::commands::{confirm, success, Context};
use crate::error::{CliError, Result};
use crate::progress::with_spinner;
use crate::render;
use crate::workflow::VersionControl;
use colored::Colorize;
use std::sync::Arc;

fn versions(ctx: &Context) -> VersionControl {
    VersionControl::new(Arc::clone(&ctx.api), ctx.cache.clone())
}

pub async fn list(ctx: &Context, model: &str) -> Result<()> {
    let history = with_spinner("Loading versions", versions(ctx).list(model)).await?;
    if history.is_empty() {
        println!("No versions recorded for {}.", model);
        return Ok(());
    }
    println!("{}", render::versions_table(&history));
    match history.rollback_target() {
        Some(target) => println!("Rollback would re-activate {}", target.version.cyan()),
        None if history.can_rollback() => println!("Rollback unavailable: the active version is the oldest"),
        None => println!("Rollback unavailable: fewer than 2 versions"),
    }
    Ok(())
}

pub async fn create(
    ctx: &Context,
    model: &str,
    version: &str,
    description: &str,
    created_by: Option<&str>,
) -> Result<()> {
    let created = versions(ctx)
        .create(model, version, description, created_by)
        .await?;
    success(format!(
        "Created version {} (id {}) for {}, inactive until activated",
        created.version.cyan(),
        created.id,
        model
    ));
    Ok(())
}

pub async fn activate(ctx: &Context, model: &str, version_id: i64) -> Result<()> {
    let (ack, history) = versions(ctx).activate(model, version_id).await?;
    let label = history
        .active()
        .map(|v| v.version.clone())
        .or(ack.version)
        .unwrap_or_else(|| version_id.to_string());
    success(format!("Activated version {} of {}", label.cyan(), model));
    Ok(())
}

pub async fn rollback(ctx: &Context, model: &str, yes: bool) -> Result<()> {
    let control = versions(ctx);
    let history = control.list(model).await?;
    if let (Some(active), Some(target)) = (history.active(), history.rollback_target()) {
        println!("Active: {}  ->  {}", active.version, target.version.cyan());
        match confirm(&format!("Roll back {}?", model), yes)? {
            None => return Ok(()),
            Some(false) => {
                return Err(CliError::ConfirmationRequired(format!("Rolling back {}", model)))
            },
            Some(true) => {},
        }
    }

    let (ack, history) = control.rollback(model).await?;
    let label = history
        .active()
        .map(|v| v.version.clone())
        .or(ack.version)
        .unwrap_or_default();
    success(format!("Rolled back {} to {}", model, label.cyan()));
    Ok(())
}

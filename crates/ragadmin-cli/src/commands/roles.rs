//! `ragadmin roles` command implementation

use crate::api::PermissionAction;
use crate::commands::{confirm, success, Context};
use crate::error::Result;
use crate::progress::with_spinner;
use crate::render;
use crate::workflow::RoleManager;
use crate::OutputFormat;
use colored::Colorize;
use std::sync::Arc;

fn manager(ctx: &Context) -> RoleManager {
    RoleManager::new(Arc::clone(&ctx.api), ctx.cache.clone())
}

fn action_list(actions: &[PermissionAction]) -> String {
    actions
        .iter()
        .map(PermissionAction::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn list(ctx: &Context, format: OutputFormat) -> Result<()> {
    let roles = with_spinner("Loading roles", manager(ctx).list()).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&roles)?),
        OutputFormat::Table if roles.is_empty() => println!("No roles found."),
        OutputFormat::Table => {
            println!("{}", render::roles_table(&roles));
            println!("{} role(s)", roles.len());
        },
    }
    Ok(())
}

pub async fn create(ctx: &Context, name: &str, description: &str) -> Result<()> {
    let role = manager(ctx).create(name, description).await?;
    success(format!("Created role {}", role.role_name.cyan()));
    Ok(())
}

pub async fn update(ctx: &Context, name: &str, description: &str) -> Result<()> {
    manager(ctx).update(name, description).await?;
    success(format!("Updated role {}", name.cyan()));
    Ok(())
}

pub async fn delete(ctx: &Context, name: &str, yes: bool) -> Result<()> {
    let roles = manager(ctx);
    // Built-in roles are refused before asking.
    if crate::api::is_system_role(name) {
        return roles.delete(name, true).await;
    }
    let Some(confirmed) = confirm(&format!("Delete role {}? This cannot be undone.", name), yes)?
    else {
        return Ok(());
    };
    roles.delete(name, confirmed).await?;
    success(format!("Deleted role {}", name.cyan()));
    Ok(())
}

pub async fn resources(ctx: &Context) -> Result<()> {
    let types = with_spinner("Loading resource types", manager(ctx).resource_types()).await?;
    for resource in types {
        println!("{}", resource);
    }
    Ok(())
}

pub async fn permissions(ctx: &Context, name: &str, format: OutputFormat) -> Result<()> {
    let perms = with_spinner("Loading permissions", manager(ctx).permissions(name)).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&perms)?),
        OutputFormat::Table if perms.permissions.is_empty() => {
            println!("Role {} has no permissions.", perms.role.name.cyan());
        },
        OutputFormat::Table => {
            println!("Role {}", perms.role.name.cyan().bold());
            println!("{}", render::permissions_table(&perms));
        },
    }
    Ok(())
}

pub async fn grant(
    ctx: &Context,
    name: &str,
    resource: &str,
    actions: &[PermissionAction],
) -> Result<()> {
    manager(ctx).grant(name, resource, actions).await?;
    success(format!(
        "Granted {} on {} to {}",
        action_list(actions),
        resource.trim(),
        name.cyan()
    ));
    Ok(())
}

pub async fn revoke(
    ctx: &Context,
    name: &str,
    resource: &str,
    actions: &[PermissionAction],
) -> Result<()> {
    manager(ctx).revoke(name, resource, actions).await?;
    success(format!(
        "Revoked {} on {} from {}",
        action_list(actions),
        resource.trim(),
        name.cyan()
    ));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_action_list() {
        assert_eq!(
            action_list(&[PermissionAction::Read, PermissionAction::Share]),
            "read, share"
        );
    }
}

//! Role and permission workflow
//!
//! Roles are listed under [`QueryKey::Roles`]; each role's permission matrix
//! lives under [`QueryKey::RolePermissions`], so invalidating `Roles` drops
//! both. The built-in roles can be read and granted to but never deleted.

use crate::api::{is_system_role, AdminApi, PermissionAction, Role, RolePermissions};
use crate::cache::{QueryCache, QueryKey};
use crate::error::{CliError, Result};
use crate::workflow::dialog::MutationGuard;
use ragadmin_common::validation;
use std::sync::Arc;
use tracing::info;

/// Role management over an [`AdminApi`]
#[derive(Clone)]
pub struct RoleManager {
    api: Arc<dyn AdminApi>,
    cache: QueryCache,
    guard: MutationGuard,
}

impl RoleManager {
    pub fn new(api: Arc<dyn AdminApi>, cache: QueryCache) -> Self {
        Self {
            api,
            cache,
            guard: MutationGuard::new(),
        }
    }

    pub async fn list(&self) -> Result<Vec<Role>> {
        self.cache
            .fetch_with(QueryKey::Roles, || self.api.list_roles())
            .await
    }

    /// Resource types that permissions can be granted on
    pub async fn resource_types(&self) -> Result<Vec<String>> {
        self.api.role_resource_types().await
    }

    pub async fn permissions(&self, name: &str) -> Result<RolePermissions> {
        self.cache
            .fetch_with(QueryKey::RolePermissions(name.to_string()), || {
                self.api.role_permissions(name)
            })
            .await
    }

    pub async fn create(&self, name: &str, description: &str) -> Result<Role> {
        let name = name.trim();
        validation::require("role_name", name)?;
        let role = self
            .guard
            .run(
                format!("create:{}", name),
                self.api.create_role(name, description.trim()),
            )
            .await?;
        info!(role = %name, "Created role");
        self.cache.invalidate(QueryKey::Roles).await;
        Ok(role)
    }

    pub async fn update(&self, name: &str, description: &str) -> Result<()> {
        self.guard
            .run(
                format!("update:{}", name),
                self.api.update_role(name, description.trim()),
            )
            .await?;
        info!(role = %name, "Updated role");
        self.cache.invalidate(QueryKey::Roles).await;
        Ok(())
    }

    pub async fn delete(&self, name: &str, confirmed: bool) -> Result<()> {
        if is_system_role(name) {
            return Err(CliError::precondition(format!(
                "'{}' is a built-in role and cannot be deleted",
                name.trim()
            )));
        }
        if !confirmed {
            return Err(CliError::ConfirmationRequired(format!("Deleting role {}", name)));
        }
        self.guard
            .run(format!("delete:{}", name), self.api.delete_role(name))
            .await?;
        info!(role = %name, "Deleted role");
        self.cache.invalidate(QueryKey::Roles).await;
        Ok(())
    }

    pub async fn grant(
        &self,
        name: &str,
        resource: &str,
        actions: &[PermissionAction],
    ) -> Result<()> {
        let resource = check_grant(resource, actions)?;
        self.guard
            .run(
                format!("permissions:{}", name),
                self.api.grant_permissions(name, resource, actions),
            )
            .await?;
        info!(role = %name, resource = %resource, actions = ?actions, "Granted permissions");
        self.cache
            .invalidate(QueryKey::RolePermissions(name.to_string()))
            .await;
        Ok(())
    }

    pub async fn revoke(
        &self,
        name: &str,
        resource: &str,
        actions: &[PermissionAction],
    ) -> Result<()> {
        let resource = check_grant(resource, actions)?;
        self.guard
            .run(
                format!("permissions:{}", name),
                self.api.revoke_permissions(name, resource, actions),
            )
            .await?;
        info!(role = %name, resource = %resource, actions = ?actions, "Revoked permissions");
        self.cache
            .invalidate(QueryKey::RolePermissions(name.to_string()))
            .await;
        Ok(())
    }
}

fn check_grant<'a>(resource: &'a str, actions: &[PermissionAction]) -> Result<&'a str> {
    let resource = resource.trim();
    validation::require("resource", resource)?;
    if actions.is_empty() {
        return Err(CliError::validation("actions", "Choose at least one action"));
    }
    Ok(resource)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::workflow::testing::FakeApi;

    fn manager(api: &Arc<FakeApi>) -> RoleManager {
        RoleManager::new(api.clone(), QueryCache::default())
    }

    #[tokio::test]
    async fn test_create_and_delete_refresh_list() {
        let api = Arc::new(FakeApi::new());
        let roles = manager(&api);
        assert!(roles.list().await.unwrap().is_empty());

        let role = roles.create("editor", "Can edit").await.unwrap();
        assert_eq!(role.role_name, "editor");
        assert_eq!(roles.list().await.unwrap().len(), 1);

        roles.update("editor", "Edits datasets").await.unwrap();
        assert_eq!(
            roles.list().await.unwrap()[0].description.as_deref(),
            Some("Edits datasets")
        );

        roles.delete("editor", true).await.unwrap();
        assert!(roles.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_role_is_conflict() {
        let api = Arc::new(FakeApi::new());
        api.add_role("editor");
        let roles = manager(&api);

        let err = roles.create("editor", "").await.unwrap_err();
        assert!(matches!(err, CliError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_system_roles_cannot_be_deleted() {
        let api = Arc::new(FakeApi::new());
        let roles = manager(&api);

        for name in ["admin", "User", "viewer"] {
            let err = roles.delete(name, true).await.unwrap_err();
            assert!(matches!(err, CliError::Precondition(_)));
        }
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation_and_name() {
        let api = Arc::new(FakeApi::new());
        api.add_role("editor");
        let roles = manager(&api);

        assert!(matches!(
            roles.delete("editor", false).await,
            Err(CliError::ConfirmationRequired(_))
        ));
        assert!(matches!(roles.create("  ", "x").await, Err(CliError::Validation(_))));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_grant_and_revoke_refresh_permissions() {
        let api = Arc::new(FakeApi::new());
        api.add_role("editor");
        let roles = manager(&api);

        let before = roles.permissions("editor").await.unwrap();
        assert!(before.permissions.is_empty());

        roles
            .grant("editor", "dataset", &[PermissionAction::Read, PermissionAction::Write])
            .await
            .unwrap();
        let granted = roles.permissions("editor").await.unwrap();
        let dataset = granted.permissions["dataset"];
        assert!(dataset.allows(PermissionAction::Read));
        assert!(dataset.allows(PermissionAction::Write));
        assert!(!dataset.allows(PermissionAction::Share));

        roles
            .revoke("editor", "dataset", &[PermissionAction::Write])
            .await
            .unwrap();
        let revoked = roles.permissions("editor").await.unwrap();
        assert!(revoked.permissions["dataset"].allows(PermissionAction::Read));
        assert!(!revoked.permissions["dataset"].allows(PermissionAction::Write));
    }

    #[tokio::test]
    async fn test_grant_requires_resource_and_actions() {
        let api = Arc::new(FakeApi::new());
        api.add_role("editor");
        let roles = manager(&api);

        assert!(matches!(
            roles.grant("editor", "dataset", &[]).await,
            Err(CliError::Validation(_))
        ));
        assert!(matches!(
            roles.revoke("editor", " ", &[PermissionAction::Read]).await,
            Err(CliError::Validation(_))
        ));
        assert_eq!(api.calls(), 0);

        let err = roles
            .grant("editor", "spaceship", &[PermissionAction::Read])
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Server { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_delete_drops_cached_permissions() {
        let api = Arc::new(FakeApi::new());
        api.add_role("editor");
        let cache = QueryCache::default();
        let roles = RoleManager::new(api.clone(), cache.clone());

        roles.permissions("editor").await.unwrap();
        roles.delete("editor", true).await.unwrap();

        let cached: Option<RolePermissions> = cache
            .get(&QueryKey::RolePermissions("editor".into()))
            .await
            .unwrap();
        assert!(cached.is_none());
    }
}

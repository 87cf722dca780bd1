//! Model version history
//!
//! Versions are append-only and at most one is active per model. Activation
//! and rollback move the active pointer; the backend enforces exclusivity and
//! the client re-fetches afterwards.

use crate::api::{AdminApi, CreateVersionRequest, ModelVersion, MutationAck};
use crate::cache::{QueryCache, QueryKey};
use crate::error::{CliError, Result};
use crate::workflow::dialog::MutationGuard;
use ragadmin_common::validation;
use std::sync::Arc;
use tracing::info;

/// Author recorded when none is given
pub const DEFAULT_CREATED_BY: &str = "admin";

/// A model's versions, newest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionHistory {
    versions: Vec<ModelVersion>,
}

impl VersionHistory {
    /// Build from a listing in any order; ids grow with creation time
    pub fn new(mut versions: Vec<ModelVersion>) -> Self {
        versions.sort_by(|a, b| b.id.cmp(&a.id));
        Self { versions }
    }

    pub fn versions(&self) -> &[ModelVersion] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn active(&self) -> Option<&ModelVersion> {
        self.versions.iter().find(|v| v.is_active)
    }

    pub fn find(&self, version_id: i64) -> Option<&ModelVersion> {
        self.versions.iter().find(|v| v.id == version_id)
    }

    /// Rollback is offered once there are at least two versions
    pub fn can_rollback(&self) -> bool {
        self.versions.len() >= 2
    }

    /// The version created immediately before the active one
    pub fn rollback_target(&self) -> Option<&ModelVersion> {
        let active = self.versions.iter().position(|v| v.is_active)?;
        self.versions.get(active + 1)
    }

    /// History as it will look after activating `version_id`
    pub fn activation_preview(&self, version_id: i64) -> Option<VersionHistory> {
        self.find(version_id)?;
        let versions = self
            .versions
            .iter()
            .cloned()
            .map(|mut v| {
                v.is_active = v.id == version_id;
                v
            })
            .collect();
        Some(VersionHistory { versions })
    }
}

/// Version workflow over an [`AdminApi`]
#[derive(Clone)]
pub struct VersionControl {
    api: Arc<dyn AdminApi>,
    cache: QueryCache,
    guard: MutationGuard,
}

impl VersionControl {
    pub fn new(api: Arc<dyn AdminApi>, cache: QueryCache) -> Self {
        Self {
            api,
            cache,
            guard: MutationGuard::new(),
        }
    }

    pub async fn list(&self, model_id: &str) -> Result<VersionHistory> {
        let versions = self
            .cache
            .fetch_with(QueryKey::ModelVersions(model_id.to_string()), || {
                self.api.list_versions(model_id)
            })
            .await?;
        Ok(VersionHistory::new(versions))
    }

    async fn reload(&self, model_id: &str) -> Result<VersionHistory> {
        let versions = self
            .cache
            .refetch(QueryKey::ModelVersions(model_id.to_string()), || {
                self.api.list_versions(model_id)
            })
            .await?;
        Ok(VersionHistory::new(versions))
    }

    /// Append a version; it starts inactive
    pub async fn create(
        &self,
        model_id: &str,
        version: &str,
        description: &str,
        created_by: Option<&str>,
    ) -> Result<ModelVersion> {
        validation::require("version", version)?;
        validation::require("description", description)?;

        let request = CreateVersionRequest {
            version: version.trim().to_string(),
            description: description.trim().to_string(),
            created_by: created_by
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_CREATED_BY)
                .to_string(),
        };
        let created = self
            .guard
            .run(
                format!("create-version:{}", model_id),
                self.api.create_version(model_id, &request),
            )
            .await?;
        info!(model = %model_id, version = %created.version, "Created model version");
        self.cache.invalidate(QueryKey::ModelVersions(model_id.to_string())).await;
        Ok(created)
    }

    /// Make `version_id` the only active version and return the refreshed history
    pub async fn activate(&self, model_id: &str, version_id: i64) -> Result<(MutationAck, VersionHistory)> {
        // Versions created elsewhere must be visible to the existence check.
        let history = self.reload(model_id).await?;
        if history.find(version_id).is_none() {
            return Err(CliError::precondition(format!(
                "model {} has no version with id {}",
                model_id, version_id
            )));
        }

        let ack = self
            .guard
            .run(
                format!("activate:{}", model_id),
                self.api.activate_version(model_id, version_id),
            )
            .await?;
        info!(model = %model_id, version_id, "Activated model version");
        self.cache.invalidate(QueryKey::ModelVersions(model_id.to_string())).await;
        Ok((ack, self.reload(model_id).await?))
    }

    /// Move the active pointer to the previous version
    pub async fn rollback(&self, model_id: &str) -> Result<(MutationAck, VersionHistory)> {
        let history = self.reload(model_id).await?;
        if !history.can_rollback() {
            return Err(CliError::precondition(format!(
                "model {} has {} version(s); rollback needs at least 2",
                model_id,
                history.len()
            )));
        }
        if history.rollback_target().is_none() {
            return Err(CliError::precondition(
                "the active version is the oldest; cannot roll back further",
            ));
        }

        let ack = self
            .guard
            .run(
                format!("rollback:{}", model_id),
                self.api.rollback_version(model_id),
            )
            .await?;
        info!(model = %model_id, "Rolled back model version");
        self.cache.invalidate(QueryKey::ModelVersions(model_id.to_string())).await;
        Ok((ack, self.reload(model_id).await?))
    }
}

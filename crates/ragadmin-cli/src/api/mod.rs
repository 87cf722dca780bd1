//! API client module
//!
//! HTTP client for the platform's admin and model-management endpoints.
//! Workflows talk to the backend through [`AdminApi`] so they can run against
//! an in-memory double in tests.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::ApiClient;
pub use types::*;

use crate::error::Result;
use async_trait::async_trait;

/// Remote operations the console depends on
///
/// The backend owns all state and enforces business rules (uniqueness,
/// version exclusivity, permissions); implementations only transport calls.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Check server health
    async fn health_check(&self) -> Result<bool>;

    async fn list_users(&self) -> Result<Vec<User>>;
    async fn get_user(&self, email: &str) -> Result<UserDetail>;
    async fn create_user(&self, email: &str, password: &str, role: &str) -> Result<()>;
    async fn set_user_status(&self, email: &str, active: bool) -> Result<()>;
    async fn set_user_password(&self, email: &str, password: &str) -> Result<()>;
    async fn delete_user(&self, email: &str) -> Result<()>;
    async fn set_user_role(&self, email: &str, role: &str) -> Result<()>;

    async fn list_roles(&self) -> Result<Vec<Role>>;
    async fn create_role(&self, name: &str, description: &str) -> Result<Role>;
    async fn update_role(&self, name: &str, description: &str) -> Result<()>;
    async fn delete_role(&self, name: &str) -> Result<()>;
    async fn role_resource_types(&self) -> Result<Vec<String>>;
    async fn role_permissions(&self, name: &str) -> Result<RolePermissions>;
    async fn grant_permissions(
        &self,
        name: &str,
        resource: &str,
        actions: &[PermissionAction],
    ) -> Result<()>;
    async fn revoke_permissions(
        &self,
        name: &str,
        resource: &str,
        actions: &[PermissionAction],
    ) -> Result<()>;

    async fn dashboard_metrics(&self) -> Result<DashboardMetrics>;

    async fn list_models(&self) -> Result<Vec<Model>>;
    async fn get_model(&self, id: &str) -> Result<Model>;
    async fn register_model(&self, input: &ModelInput) -> Result<MutationAck>;
    async fn update_model(&self, id: &str, input: &ModelInput) -> Result<MutationAck>;
    async fn delete_model(&self, id: &str) -> Result<MutationAck>;

    /// Start a benchmark; returns immediately with the run in `running` state
    async fn run_benchmark(&self, id: &str, test_type: TestType) -> Result<BenchmarkRun>;
    async fn list_benchmarks(&self, model_id: Option<&str>) -> Result<Vec<BenchmarkRun>>;
    async fn compare_models(&self, model_ids: &[String]) -> Result<ModelComparison>;

    async fn list_versions(&self, model_id: &str) -> Result<Vec<ModelVersion>>;
    async fn create_version(
        &self,
        model_id: &str,
        request: &CreateVersionRequest,
    ) -> Result<ModelVersion>;
    async fn activate_version(&self, model_id: &str, version_id: i64) -> Result<MutationAck>;
    async fn rollback_version(&self, model_id: &str) -> Result<MutationAck>;
}

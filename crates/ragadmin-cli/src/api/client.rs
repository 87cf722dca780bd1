//! HTTP API client for the platform backend
//!
//! Unwraps the `{code, message, data}` envelope and maps every failure into
//! the console's error taxonomy. No call is retried.

use crate::api::{endpoints, types::*, AdminApi};
use crate::config::Config;
use crate::error::{CliError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

// ============================================================================
// API Client Constants
// ============================================================================

/// Default timeout for API requests in seconds.
/// Can be overridden via RAGADMIN_API_TIMEOUT_SECS or the config file.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// API client for the admin backend
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client with the default timeout
    pub fn new(base_url: String) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_API_TIMEOUT_SECS))
    }

    /// Create a client with an explicit request timeout
    pub fn with_timeout(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CliError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create from resolved configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Self::with_timeout(
            config.server_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(client.with_token(config.token.clone()))
    }

    /// Attach a bearer token passed through verbatim on every request
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and decode the envelope payload
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let url = response.url().to_string();
        let body = response.text().await?;

        let envelope = serde_json::from_str::<ApiEnvelope>(&body).ok();

        if !status.is_success() {
            let message = envelope
                .map(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| fallback_message(status, &body));
            warn!(url = %url, status = status.as_u16(), message = %message, "Request rejected");
            return Err(CliError::from_status(status.as_u16(), message));
        }

        let envelope = envelope.ok_or_else(|| CliError::Server {
            status: status.as_u16(),
            message: format!("Response from {} is not a JSON envelope", url),
        })?;

        if !envelope.is_success() {
            let code = u16::try_from(envelope.code).unwrap_or(500);
            warn!(url = %url, code = envelope.code, message = %envelope.message, "Backend returned error code");
            return Err(CliError::from_status(code, envelope.message));
        }

        debug!(url = %url, "Request succeeded");
        Ok(serde_json::from_value(envelope.data)?)
    }

    /// Like [`send`](Self::send) but also treats `status: "failed"` acks as errors
    async fn send_ack(&self, request: RequestBuilder, what: &str) -> Result<MutationAck> {
        let ack: MutationAck = self.send(request).await?;
        if ack.status == "failed" {
            return Err(CliError::Server {
                status: 200,
                message: ack
                    .message
                    .unwrap_or_else(|| format!("Backend reported failure to {}", what)),
            });
        }
        Ok(ack)
    }
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() || body.len() > 200 {
        status
            .canonical_reason()
            .unwrap_or("Unexpected response")
            .to_string()
    } else {
        body.to_string()
    }
}

#[async_trait]
impl AdminApi for ApiClient {
    async fn health_check(&self) -> Result<bool> {
        let url = endpoints::health_url(&self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let url = endpoints::users_url(&self.base_url);
        self.send(self.client.get(&url)).await
    }

    async fn get_user(&self, email: &str) -> Result<UserDetail> {
        let url = endpoints::user_url(&self.base_url, email);
        self.send(self.client.get(&url)).await
    }

    async fn create_user(&self, email: &str, password: &str, role: &str) -> Result<()> {
        let url = endpoints::users_url(&self.base_url);
        let request = CreateUserRequest {
            username: email.to_string(),
            password: password.to_string(),
            role: role.to_string(),
        };
        let _: serde_json::Value = self.send(self.client.post(&url).json(&request)).await?;
        Ok(())
    }

    async fn set_user_status(&self, email: &str, active: bool) -> Result<()> {
        let url = endpoints::user_status_url(&self.base_url, email);
        let request = UserStatusRequest::new(active);
        let _: serde_json::Value = self.send(self.client.put(&url).json(&request)).await?;
        Ok(())
    }

    async fn set_user_password(&self, email: &str, password: &str) -> Result<()> {
        let url = endpoints::user_password_url(&self.base_url, email);
        let request = PasswordRequest {
            new_password: password.to_string(),
        };
        let _: serde_json::Value = self.send(self.client.put(&url).json(&request)).await?;
        Ok(())
    }

    async fn delete_user(&self, email: &str) -> Result<()> {
        let url = endpoints::user_url(&self.base_url, email);
        let _: serde_json::Value = self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    async fn set_user_role(&self, email: &str, role: &str) -> Result<()> {
        let url = endpoints::user_url(&self.base_url, email);
        let request = UserRoleRequest {
            role: role.to_string(),
        };
        let _: serde_json::Value = self.send(self.client.put(&url).json(&request)).await?;
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let url = endpoints::roles_url(&self.base_url);
        let list: RoleList = self.send(self.client.get(&url)).await?;
        Ok(list.roles)
    }

    async fn create_role(&self, name: &str, description: &str) -> Result<Role> {
        let url = endpoints::roles_url(&self.base_url);
        let request = CreateRoleRequest {
            role_name: name.to_string(),
            description: description.to_string(),
        };
        self.send(self.client.post(&url).json(&request)).await
    }

    async fn update_role(&self, name: &str, description: &str) -> Result<()> {
        let url = endpoints::role_url(&self.base_url, name);
        let request = UpdateRoleRequest {
            description: description.to_string(),
        };
        let _: serde_json::Value = self.send(self.client.put(&url).json(&request)).await?;
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> Result<()> {
        let url = endpoints::role_url(&self.base_url, name);
        let _: serde_json::Value = self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    async fn role_resource_types(&self) -> Result<Vec<String>> {
        let url = endpoints::role_resources_url(&self.base_url);
        let types: ResourceTypes = self.send(self.client.get(&url)).await?;
        Ok(types.resource_types)
    }

    async fn role_permissions(&self, name: &str) -> Result<RolePermissions> {
        let url = endpoints::role_permission_url(&self.base_url, name);
        self.send(self.client.get(&url)).await
    }

    async fn grant_permissions(
        &self,
        name: &str,
        resource: &str,
        actions: &[PermissionAction],
    ) -> Result<()> {
        let url = endpoints::role_permission_url(&self.base_url, name);
        let request = GrantPermissionRequest {
            resource: resource.to_string(),
            actions: actions.to_vec(),
        };
        let _: serde_json::Value = self.send(self.client.post(&url).json(&request)).await?;
        Ok(())
    }

    async fn revoke_permissions(
        &self,
        name: &str,
        resource: &str,
        actions: &[PermissionAction],
    ) -> Result<()> {
        let url = endpoints::revoke_permission_url(&self.base_url, name, resource, actions);
        let _: serde_json::Value = self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    async fn dashboard_metrics(&self) -> Result<DashboardMetrics> {
        let url = endpoints::dashboard_metrics_url(&self.base_url);
        self.send(self.client.get(&url)).await
    }

    async fn list_models(&self) -> Result<Vec<Model>> {
        let url = endpoints::models_url(&self.base_url);
        let listing: ModelListing = self.send(self.client.get(&url)).await?;
        Ok(listing.into_models())
    }

    async fn get_model(&self, id: &str) -> Result<Model> {
        let url = endpoints::model_url(&self.base_url, id);
        self.send(self.client.get(&url)).await
    }

    async fn register_model(&self, input: &ModelInput) -> Result<MutationAck> {
        let url = endpoints::models_url(&self.base_url);
        self.send_ack(self.client.post(&url).json(input), "register model")
            .await
    }

    async fn update_model(&self, id: &str, input: &ModelInput) -> Result<MutationAck> {
        let url = endpoints::model_url(&self.base_url, id);
        self.send_ack(self.client.put(&url).json(input), "update model")
            .await
    }

    async fn delete_model(&self, id: &str) -> Result<MutationAck> {
        let url = endpoints::model_url(&self.base_url, id);
        self.send_ack(self.client.delete(&url), "delete model").await
    }

    async fn run_benchmark(&self, id: &str, test_type: TestType) -> Result<BenchmarkRun> {
        let url = endpoints::run_benchmark_url(&self.base_url, id);
        let request = RunBenchmarkRequest { test_type };
        self.send(self.client.post(&url).json(&request)).await
    }

    async fn list_benchmarks(&self, model_id: Option<&str>) -> Result<Vec<BenchmarkRun>> {
        let url = endpoints::benchmarks_url(&self.base_url, model_id);
        let list: BenchmarkList = self.send(self.client.get(&url)).await?;
        Ok(list.benchmarks)
    }

    async fn compare_models(&self, model_ids: &[String]) -> Result<ModelComparison> {
        let url = endpoints::compare_models_url(&self.base_url);
        let request = CompareRequest {
            model_ids: model_ids.to_vec(),
        };
        self.send(self.client.post(&url).json(&request)).await
    }

    async fn list_versions(&self, model_id: &str) -> Result<Vec<ModelVersion>> {
        let url = endpoints::versions_url(&self.base_url, model_id);
        let list: VersionList = self.send(self.client.get(&url)).await?;
        Ok(list.versions)
    }

    async fn create_version(
        &self,
        model_id: &str,
        request: &CreateVersionRequest,
    ) -> Result<ModelVersion> {
        let url = endpoints::versions_url(&self.base_url, model_id);
        self.send(self.client.post(&url).json(request)).await
    }

    async fn activate_version(&self, model_id: &str, version_id: i64) -> Result<MutationAck> {
        let url = endpoints::activate_version_url(&self.base_url, model_id, version_id);
        self.send_ack(self.client.post(&url), "activate version").await
    }

    async fn rollback_version(&self, model_id: &str) -> Result<MutationAck> {
        let url = endpoints::rollback_version_url(&self.base_url, model_id);
        self.send_ack(self.client.post(&url), "roll back version").await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn ok(data: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"code": 0, "message": "success", "data": data}))
    }

    #[test]
    fn test_api_client_creation() {
        let client = ApiClient::new("http://localhost:9380/".to_string()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9380");
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let client = ApiClient::new("http://127.0.0.1:9".to_string()).unwrap();
        assert!(!client.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_list_users_unwraps_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/admin/users"))
            .and(header("authorization", "Bearer t0k"))
            .respond_with(ok(json!([
                {"email": "a@x.com", "nickname": "a", "is_active": true, "is_superuser": true, "create_date": "2024-01-01"}
            ])))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri())
            .unwrap()
            .with_token(Some("t0k".into()));
        let users = client.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(users[0].is_superuser);
    }

    #[tokio::test]
    async fn test_envelope_error_code_maps_to_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/admin/users"))
            .and(body_json(json!({"username": "a@x.com", "password": "secret1", "role": "user"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 400, "message": "User 'a@x.com' already exists", "data": false
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let err = client.create_user("a@x.com", "secret1", DEFAULT_USER_ROLE).await.unwrap_err();
        assert!(matches!(err, CliError::Conflict(ref m) if m.contains("already exists")));
    }

    #[tokio::test]
    async fn test_role_calls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/admin/roles"))
            .respond_with(ok(json!({"roles": [
                {"id": "r1", "role_name": "editor", "description": "", "create_date": 1718000000000i64, "update_date": null}
            ], "total": 1})))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v1/admin/users/a%40x.com"))
            .and(body_json(json!({"role": "editor"})))
            .respond_with(ok(json!({"user_name": "a@x.com", "role_name": "editor"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/admin/roles/editor/permission"))
            .and(body_json(json!({"resource": "dataset", "actions": ["read", "write"]})))
            .respond_with(ok(json!({"role_name": "editor", "resource": "dataset"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1/admin/roles/editor/permission"))
            .and(query_param("resource", "dataset"))
            .and(query_param("actions", "write"))
            .respond_with(ok(json!({"role_name": "editor", "resource": "dataset"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let roles = client.list_roles().await.unwrap();
        assert_eq!(roles[0].role_name, "editor");

        client.set_user_role("a@x.com", "editor").await.unwrap();
        client
            .grant_permissions("editor", "dataset", &[PermissionAction::Read, PermissionAction::Write])
            .await
            .unwrap();
        client
            .revoke_permissions("editor", "dataset", &[PermissionAction::Write])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_http_404_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models/registry/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": 404, "message": "Model not found", "data": false
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let err = client.get_model("missing").await.unwrap_err();
        assert!(matches!(err, CliError::NotFound(ref m) if m == "Model not found"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let client = ApiClient::new("http://127.0.0.1:9".to_string()).unwrap();
        let err = client.list_users().await.unwrap_err();
        assert!(matches!(err, CliError::Network(_)));
    }

    #[tokio::test]
    async fn test_failed_delete_ack_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/models/registry/m1"))
            .respond_with(ok(json!({"id": "m1", "status": "failed"})))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        assert!(matches!(
            client.delete_model("m1").await,
            Err(CliError::Server { .. })
        ));
    }

    #[tokio::test]
    async fn test_benchmark_list_query_and_run_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models/benchmark"))
            .and(query_param("model_id", "m1"))
            .respond_with(ok(json!({"benchmarks": [
                {"id": 1, "model_id": "m1", "test_type": "quality", "status": "completed",
                 "results": {"overall_score": 0.873}, "timestamp": "2024-01-01T00:00:00"}
            ], "total": 1})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/models/benchmark/m1/run"))
            .and(body_json(json!({"test_type": "throughput"})))
            .respond_with(ok(json!({"id": 2, "model_id": "m1", "test_type": "throughput",
                                     "status": "running", "timestamp": "2024-01-01T00:00:01"})))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let runs = client.list_benchmarks(Some("m1")).await.unwrap();
        assert_eq!(runs[0].result_f64("overall_score"), Some(0.873));

        let run = client.run_benchmark("m1", TestType::Throughput).await.unwrap();
        assert_eq!(run.status, RunStatus::Running);
    }
}

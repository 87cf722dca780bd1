//! API endpoint URL builders
//!
//! Helper functions to construct API endpoint URLs. Paths are fixed strings
//! the backend routes on; dynamic segments are percent-encoded.

use crate::api::types::PermissionAction;
use urlencoding::encode;

/// API prefix shared by every versioned route
const API_PREFIX: &str = "/v1";

fn v1(base_url: &str, path: &str) -> String {
    format!("{}{}{}", base_url.trim_end_matches('/'), API_PREFIX, path)
}

// ============================================================================
// Users
// ============================================================================

/// `GET` list / `POST` create
pub fn users_url(base_url: &str) -> String {
    v1(base_url, "/admin/users")
}

/// `GET` detail / `DELETE`
pub fn user_url(base_url: &str, email: &str) -> String {
    v1(base_url, &format!("/admin/users/{}", encode(email)))
}

/// `PUT` with `{ activate_status }`
pub fn user_status_url(base_url: &str, email: &str) -> String {
    v1(base_url, &format!("/admin/users/{}/activate", encode(email)))
}

/// `PUT` with `{ new_password }`
pub fn user_password_url(base_url: &str, email: &str) -> String {
    v1(base_url, &format!("/admin/users/{}/password", encode(email)))
}

// ============================================================================
// Roles
// ============================================================================

/// `GET` list / `POST` create
pub fn roles_url(base_url: &str) -> String {
    v1(base_url, "/admin/roles")
}

/// `PUT` description / `DELETE`
pub fn role_url(base_url: &str, name: &str) -> String {
    v1(base_url, &format!("/admin/roles/{}", encode(name)))
}

/// Resource types permissions can be granted on
pub fn role_resources_url(base_url: &str) -> String {
    v1(base_url, "/admin/roles/resource")
}

/// `GET` permissions / `POST` grant
pub fn role_permission_url(base_url: &str, name: &str) -> String {
    v1(base_url, &format!("/admin/roles/{}/permission", encode(name)))
}

/// `DELETE`; revoked actions travel as a comma-separated query value
pub fn revoke_permission_url(
    base_url: &str,
    name: &str,
    resource: &str,
    actions: &[PermissionAction],
) -> String {
    let actions = actions
        .iter()
        .map(PermissionAction::as_str)
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "{}?resource={}&actions={}",
        role_permission_url(base_url, name),
        encode(resource),
        encode(&actions)
    )
}

/// Dashboard metrics snapshot
pub fn dashboard_metrics_url(base_url: &str) -> String {
    v1(base_url, "/admin/dashboard/metrics")
}

// ============================================================================
// Model registry
// ============================================================================

/// `GET` list / `POST` register
pub fn models_url(base_url: &str) -> String {
    v1(base_url, "/models/registry")
}

/// `GET` detail / `PUT` update / `DELETE`
pub fn model_url(base_url: &str, id: &str) -> String {
    v1(base_url, &format!("/models/registry/{}", encode(id)))
}

/// Start a benchmark run
pub fn run_benchmark_url(base_url: &str, id: &str) -> String {
    v1(base_url, &format!("/models/benchmark/{}/run", encode(id)))
}

/// Benchmark runs, optionally for one model
pub fn benchmarks_url(base_url: &str, model_id: Option<&str>) -> String {
    let mut url = v1(base_url, "/models/benchmark");
    if let Some(id) = model_id {
        url.push_str(&format!("?model_id={}", encode(id)));
    }
    url
}

/// Compare benchmark figures across models
pub fn compare_models_url(base_url: &str) -> String {
    v1(base_url, "/models/benchmark/compare")
}

// ============================================================================
// Versions
// ============================================================================

/// `GET` history / `POST` create
pub fn versions_url(base_url: &str, model_id: &str) -> String {
    v1(base_url, &format!("/models/versions/{}", encode(model_id)))
}

/// Activate one version
pub fn activate_version_url(base_url: &str, model_id: &str, version_id: i64) -> String {
    v1(
        base_url,
        &format!("/models/versions/{}/{}/activate", encode(model_id), version_id),
    )
}

/// Move the active pointer to the previous version
pub fn rollback_version_url(base_url: &str, model_id: &str) -> String {
    v1(base_url, &format!("/models/versions/{}/rollback", encode(model_id)))
}

/// Build health check URL
pub fn health_url(base_url: &str) -> String {
    format!("{}/health", base_url.trim_end_matches('/'))
}

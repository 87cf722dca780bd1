//! In-memory [`AdminApi`] used by workflow tests
//!
//! Mirrors the backend's rules closely enough to exercise the workflows:
//! unique emails, newest-first version history with exclusive activation, and
//! benchmark runs that finish after a configurable number of list polls.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::api::*;
use crate::error::{CliError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    users: Vec<User>,
    models: Vec<Model>,
    versions: HashMap<String, Vec<ModelVersion>>,
    runs: Vec<(BenchmarkRun, usize)>,
    metrics: DashboardMetrics,
    user_roles: HashMap<String, String>,
    roles: Vec<Role>,
    permissions: HashMap<String, BTreeMap<String, PermissionSet>>,
}

/// Resource types the fake accepts for grants
pub const RESOURCE_TYPES: [&str; 5] = ["dataset", "agent", "chat", "user", "file"];

pub struct FakeApi {
    state: Mutex<State>,
    calls: AtomicUsize,
    /// Number of benchmark list polls before a running job completes
    pub complete_after: AtomicUsize,
    pub fail_metrics: AtomicBool,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            calls: AtomicUsize::new(0),
            complete_after: AtomicUsize::new(1),
            fail_metrics: AtomicBool::new(false),
        }
    }

    pub fn add_role(&self, name: &str) {
        self.state.lock().unwrap().roles.push(Role {
            id: json!(format!("r-{}", name)),
            role_name: name.into(),
            description: None,
            create_date: json!(1718000000000i64),
            update_date: serde_json::Value::Null,
        });
    }

    /// Role the user was created with or last moved to
    pub fn role_of(&self, email: &str) -> Option<String> {
        self.state.lock().unwrap().user_roles.get(email).cloned()
    }

    /// Number of remote calls issued so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn add_user(&self, email: &str) {
        self.state.lock().unwrap().users.push(User {
            email: email.into(),
            nickname: email.split('@').next().unwrap_or_default().into(),
            is_active: true,
            is_superuser: false,
            create_date: "2024-01-01 00:00:00".into(),
            last_login_time: None,
        });
    }

    pub fn add_model(&self, id: &str, name: &str) {
        self.state.lock().unwrap().models.push(Model {
            id: id.into(),
            name: name.into(),
            model_type: ModelType::Chat,
            factory: "Ollama".into(),
            status: ModelStatus::Active,
            api_base: None,
            api_key_set: None,
            created_at: None,
            updated_at: None,
        });
    }

    pub fn add_version(&self, model_id: &str, version: &str, active: bool) {
        let mut state = self.state.lock().unwrap();
        let history = state.versions.entry(model_id.to_string()).or_default();
        let id = history.len() as i64 + 1;
        history.insert(
            0,
            ModelVersion {
                id,
                version: version.into(),
                description: format!("release {}", version),
                is_active: active,
                created_at: format!("2024-01-0{}T00:00:00", id),
                created_by: "admin".into(),
            },
        );
    }

    pub fn set_metrics(&self, metrics: DashboardMetrics) {
        self.state.lock().unwrap().metrics = metrics;
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn set_flags(
        &self,
        name: &str,
        resource: &str,
        actions: &[PermissionAction],
        value: bool,
    ) -> Result<()> {
        self.hit();
        let mut state = self.state.lock().unwrap();
        if !state.roles.iter().any(|r| r.role_name == name) {
            return Err(missing("Role", name));
        }
        if !RESOURCE_TYPES.contains(&resource) {
            return Err(CliError::from_status(
                400,
                format!("Invalid resource type '{}'", resource),
            ));
        }
        let set = state
            .permissions
            .entry(name.to_string())
            .or_default()
            .entry(resource.to_string())
            .or_default();
        for action in actions {
            match action {
                PermissionAction::Enable => set.enable = value,
                PermissionAction::Read => set.read = value,
                PermissionAction::Write => set.write = value,
                PermissionAction::Share => set.share = value,
            }
        }
        Ok(())
    }
}

fn missing(what: &str, key: &str) -> CliError {
    CliError::from_status(404, format!("{} {} not found", what, key))
}

fn ack(status: &str) -> MutationAck {
    MutationAck {
        id: None,
        status: status.into(),
        version: None,
        message: None,
    }
}

fn results_for(test_type: TestType) -> serde_json::Value {
    match test_type {
        TestType::Latency => json!({"avg_latency_ms": 12.345, "min_latency_ms": 10.0}),
        TestType::Quality => json!({"overall_score": 0.873}),
        TestType::Throughput => json!({"requests_per_second": 25.5}),
        TestType::Other => json!({"error": "Unknown test type"}),
    }
}

#[async_trait]
impl AdminApi for FakeApi {
    async fn health_check(&self) -> Result<bool> {
        self.hit();
        Ok(true)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.hit();
        Ok(self.state.lock().unwrap().users.clone())
    }

    async fn get_user(&self, email: &str) -> Result<UserDetail> {
        self.hit();
        let state = self.state.lock().unwrap();
        let user = state
            .users
            .iter()
            .find(|u| u.email == email)
            .ok_or_else(|| missing("User", email))?;
        Ok(UserDetail {
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            language: Some("English".into()),
            last_login_time: user.last_login_time.clone(),
            is_active: user.is_active,
            is_anonymous: false,
            login_channel: Some("password".into()),
            is_superuser: user.is_superuser,
            create_date: user.create_date.clone(),
            update_date: None,
        })
    }

    async fn create_user(&self, email: &str, _password: &str, role: &str) -> Result<()> {
        self.hit();
        if self.state.lock().unwrap().users.iter().any(|u| u.email == email) {
            return Err(CliError::from_status(400, format!("User '{}' already exists", email)));
        }
        self.add_user(email);
        self.state
            .lock()
            .unwrap()
            .user_roles
            .insert(email.to_string(), role.to_string());
        Ok(())
    }

    async fn set_user_role(&self, email: &str, role: &str) -> Result<()> {
        self.hit();
        let mut state = self.state.lock().unwrap();
        if !is_system_role(role) && !state.roles.iter().any(|r| r.role_name == role) {
            return Err(missing("Role", role));
        }
        let user = state
            .users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| missing("User", email))?;
        user.is_superuser = role.eq_ignore_ascii_case("admin");
        state.user_roles.insert(email.to_string(), role.to_string());
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        self.hit();
        Ok(self.state.lock().unwrap().roles.clone())
    }

    async fn create_role(&self, name: &str, description: &str) -> Result<Role> {
        self.hit();
        if self.state.lock().unwrap().roles.iter().any(|r| r.role_name == name) {
            return Err(CliError::from_status(400, format!("Role '{}' already exists", name)));
        }
        self.add_role(name);
        let mut state = self.state.lock().unwrap();
        let role = state
            .roles
            .iter_mut()
            .find(|r| r.role_name == name)
            .ok_or_else(|| missing("Role", name))?;
        role.description = Some(description.to_string());
        Ok(role.clone())
    }

    async fn update_role(&self, name: &str, description: &str) -> Result<()> {
        self.hit();
        let mut state = self.state.lock().unwrap();
        let role = state
            .roles
            .iter_mut()
            .find(|r| r.role_name == name)
            .ok_or_else(|| missing("Role", name))?;
        role.description = Some(description.to_string());
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> Result<()> {
        self.hit();
        if is_system_role(name) {
            return Err(CliError::from_status(403, format!("Cannot delete system role '{}'", name)));
        }
        let mut state = self.state.lock().unwrap();
        let before = state.roles.len();
        state.roles.retain(|r| r.role_name != name);
        if state.roles.len() == before {
            return Err(missing("Role", name));
        }
        state.permissions.remove(name);
        Ok(())
    }

    async fn role_resource_types(&self) -> Result<Vec<String>> {
        self.hit();
        Ok(RESOURCE_TYPES.iter().map(|r| r.to_string()).collect())
    }

    async fn role_permissions(&self, name: &str) -> Result<RolePermissions> {
        self.hit();
        let state = self.state.lock().unwrap();
        let role = state
            .roles
            .iter()
            .find(|r| r.role_name == name)
            .ok_or_else(|| missing("Role", name))?;
        Ok(RolePermissions {
            role: RoleRef {
                id: role.id.clone(),
                name: role.role_name.clone(),
                description: role.description.clone(),
            },
            permissions: state.permissions.get(name).cloned().unwrap_or_default(),
        })
    }

    async fn grant_permissions(
        &self,
        name: &str,
        resource: &str,
        actions: &[PermissionAction],
    ) -> Result<()> {
        self.set_flags(name, resource, actions, true)
    }

    async fn revoke_permissions(
        &self,
        name: &str,
        resource: &str,
        actions: &[PermissionAction],
    ) -> Result<()> {
        self.set_flags(name, resource, actions, false)
    }

    async fn set_user_status(&self, email: &str, active: bool) -> Result<()> {
        self.hit();
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| missing("User", email))?;
        user.is_active = active;
        Ok(())
    }

    async fn set_user_password(&self, email: &str, _password: &str) -> Result<()> {
        self.hit();
        let state = self.state.lock().unwrap();
        if !state.users.iter().any(|u| u.email == email) {
            return Err(missing("User", email));
        }
        Ok(())
    }

    async fn delete_user(&self, email: &str) -> Result<()> {
        self.hit();
        let mut state = self.state.lock().unwrap();
        let before = state.users.len();
        state.users.retain(|u| u.email != email);
        if state.users.len() == before {
            return Err(missing("User", email));
        }
        Ok(())
    }

    async fn dashboard_metrics(&self) -> Result<DashboardMetrics> {
        self.hit();
        if self.fail_metrics.load(Ordering::SeqCst) {
            return Err(CliError::Network("connection refused".into()));
        }
        Ok(self.state.lock().unwrap().metrics.clone())
    }

    async fn list_models(&self) -> Result<Vec<Model>> {
        self.hit();
        Ok(self.state.lock().unwrap().models.clone())
    }

    async fn get_model(&self, id: &str) -> Result<Model> {
        self.hit();
        let state = self.state.lock().unwrap();
        state
            .models
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| missing("Model", id))
    }

    async fn register_model(&self, input: &ModelInput) -> Result<MutationAck> {
        self.hit();
        let mut state = self.state.lock().unwrap();
        let id = format!("model_{}", state.models.len() + 1);
        state.models.push(Model {
            id: id.clone(),
            name: input.name.clone().unwrap_or_default(),
            model_type: input.model_type.unwrap_or(ModelType::Other),
            factory: input.factory.clone().unwrap_or_default(),
            status: input.status.unwrap_or(ModelStatus::Active),
            api_base: input.api_base.clone(),
            api_key_set: Some(input.api_key.is_some()),
            created_at: None,
            updated_at: None,
        });
        Ok(MutationAck {
            id: Some(json!(id)),
            ..ack("registered")
        })
    }

    async fn update_model(&self, id: &str, input: &ModelInput) -> Result<MutationAck> {
        self.hit();
        let mut state = self.state.lock().unwrap();
        let model = state
            .models
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| missing("Model", id))?;
        if let Some(name) = &input.name {
            model.name = name.clone();
        }
        if let Some(status) = input.status {
            model.status = status;
        }
        Ok(ack("updated"))
    }

    async fn delete_model(&self, id: &str) -> Result<MutationAck> {
        self.hit();
        let mut state = self.state.lock().unwrap();
        let before = state.models.len();
        state.models.retain(|m| m.id != id);
        if state.models.len() == before {
            return Err(missing("Model", id));
        }
        Ok(ack("deleted"))
    }

    async fn run_benchmark(&self, id: &str, test_type: TestType) -> Result<BenchmarkRun> {
        self.hit();
        let mut state = self.state.lock().unwrap();
        let name = state
            .models
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.name.clone())
            .ok_or_else(|| missing("Model", id))?;
        let run = BenchmarkRun {
            id: json!(state.runs.len() + 1),
            model_id: id.into(),
            model_name: name,
            test_type,
            status: RunStatus::Running,
            results: None,
            error: None,
            timestamp: format!("2024-05-01T00:00:0{}", state.runs.len()),
        };
        state.runs.insert(0, (run.clone(), 0));
        Ok(run)
    }

    async fn list_benchmarks(&self, model_id: Option<&str>) -> Result<Vec<BenchmarkRun>> {
        self.hit();
        let complete_after = self.complete_after.load(Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let mut listed = Vec::new();
        for (run, polls) in state.runs.iter_mut() {
            if model_id.is_some_and(|id| id != run.model_id) {
                continue;
            }
            *polls += 1;
            if run.status == RunStatus::Running && *polls >= complete_after {
                run.status = RunStatus::Completed;
                run.results = Some(results_for(run.test_type));
            }
            listed.push(run.clone());
        }
        Ok(listed)
    }

    async fn compare_models(&self, model_ids: &[String]) -> Result<ModelComparison> {
        self.hit();
        let state = self.state.lock().unwrap();
        let models = model_ids
            .iter()
            .filter_map(|id| state.models.iter().find(|m| &m.id == id))
            .map(|m| ModelScore {
                id: m.id.clone(),
                name: m.name.clone(),
                latency: None,
                quality: None,
                throughput: None,
            })
            .collect();
        Ok(ModelComparison { models })
    }

    async fn list_versions(&self, model_id: &str) -> Result<Vec<ModelVersion>> {
        self.hit();
        Ok(self
            .state
            .lock()
            .unwrap()
            .versions
            .get(model_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_version(
        &self,
        model_id: &str,
        request: &CreateVersionRequest,
    ) -> Result<ModelVersion> {
        self.hit();
        self.add_version(model_id, &request.version, false);
        let state = self.state.lock().unwrap();
        let mut created = state.versions[model_id][0].clone();
        created.description = request.description.clone();
        created.created_by = request.created_by.clone();
        Ok(created)
    }

    async fn activate_version(&self, model_id: &str, version_id: i64) -> Result<MutationAck> {
        self.hit();
        let mut state = self.state.lock().unwrap();
        let history = state.versions.entry(model_id.to_string()).or_default();
        if !history.iter().any(|v| v.id == version_id) {
            return Err(CliError::from_status(400, format!("Version {} not found", version_id)));
        }
        for v in history.iter_mut() {
            v.is_active = v.id == version_id;
        }
        Ok(ack("activated"))
    }

    async fn rollback_version(&self, model_id: &str) -> Result<MutationAck> {
        self.hit();
        let mut state = self.state.lock().unwrap();
        let history = state.versions.entry(model_id.to_string()).or_default();
        let current = history.iter().position(|v| v.is_active);
        match current {
            Some(idx) if idx + 1 < history.len() => {
                history[idx].is_active = false;
                history[idx + 1].is_active = true;
                Ok(ack("rolled_back"))
            },
            _ => Err(CliError::from_status(400, "Cannot rollback further")),
        }
    }
}

//! API request and response types
//!
//! Matches the backend API structure. Every response is wrapped in an
//! [`ApiEnvelope`]; `code == 0` means success.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Standard API response wrapper
///
/// `data` is kept as raw JSON because failed calls answer with `data: false`
/// instead of the success payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ApiEnvelope {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

// ============================================================================
// Users
// ============================================================================

/// A row of the user directory, keyed by email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(deserialize_with = "flag")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_superuser: bool,
    #[serde(default)]
    pub create_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_time: Option<String>,
}

impl User {
    pub fn role_label(&self) -> &'static str {
        if self.is_superuser {
            "Admin"
        } else {
            "User"
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_active {
            "Active"
        } else {
            "Inactive"
        }
    }
}

/// Full user record returned by the detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetail {
    pub email: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub last_login_time: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_anonymous: bool,
    #[serde(default)]
    pub login_channel: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub is_superuser: bool,
    #[serde(default)]
    pub create_date: String,
    #[serde(default)]
    pub update_date: Option<String>,
}

/// Request to register a user
#[derive(Debug, Clone, Serialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: String,
}

/// Request to switch a user on or off
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserStatusRequest {
    pub activate_status: String,
}

impl UserStatusRequest {
    pub fn new(active: bool) -> Self {
        Self {
            activate_status: if active { "on" } else { "off" }.to_string(),
        }
    }
}

/// Request to replace a user's password
#[derive(Debug, Clone, Serialize)]
pub struct PasswordRequest {
    pub new_password: String,
}

/// Role given to users created without an explicit one
pub const DEFAULT_USER_ROLE: &str = "user";

/// Request to move a user to another role
#[derive(Debug, Clone, Serialize)]
pub struct UserRoleRequest {
    pub role: String,
}

// ============================================================================
// Roles
// ============================================================================

/// Built-in roles the backend refuses to delete
pub const SYSTEM_ROLES: [&str; 3] = ["admin", "user", "viewer"];

pub fn is_system_role(name: &str) -> bool {
    SYSTEM_ROLES.iter().any(|r| r.eq_ignore_ascii_case(name.trim()))
}

/// A named role; dates are epoch millis or strings depending on the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default)]
    pub id: serde_json::Value,
    pub role_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub create_date: serde_json::Value,
    #[serde(default)]
    pub update_date: serde_json::Value,
}

/// Role listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleList {
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRoleRequest {
    pub role_name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateRoleRequest {
    pub description: String,
}

/// What a role may do with one resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    Enable,
    Read,
    Write,
    Share,
}

impl PermissionAction {
    pub const ALL: [PermissionAction; 4] = [
        PermissionAction::Enable,
        PermissionAction::Read,
        PermissionAction::Write,
        PermissionAction::Share,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionAction::Enable => "enable",
            PermissionAction::Read => "read",
            PermissionAction::Write => "write",
            PermissionAction::Share => "share",
        }
    }
}

impl std::fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PermissionAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "enable" => Ok(PermissionAction::Enable),
            "read" => Ok(PermissionAction::Read),
            "write" => Ok(PermissionAction::Write),
            "share" => Ok(PermissionAction::Share),
            _ => Err(format!(
                "Invalid action: {}. Valid: enable, read, write, share",
                s
            )),
        }
    }
}

/// Permission flags of one resource type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionSet {
    pub enable: bool,
    pub read: bool,
    pub write: bool,
    pub share: bool,
}

impl PermissionSet {
    pub fn allows(&self, action: PermissionAction) -> bool {
        match action {
            PermissionAction::Enable => self.enable,
            PermissionAction::Read => self.read,
            PermissionAction::Write => self.write,
            PermissionAction::Share => self.share,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRef {
    #[serde(default)]
    pub id: serde_json::Value,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A role with its permissions, keyed by resource type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolePermissions {
    pub role: RoleRef,
    #[serde(default)]
    pub permissions: BTreeMap<String, PermissionSet>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GrantPermissionRequest {
    pub resource: String,
    pub actions: Vec<PermissionAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTypes {
    #[serde(default)]
    pub resource_types: Vec<String>,
}

// ============================================================================
// Models
// ============================================================================

/// Kind of model served by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Chat,
    Embedding,
    Rerank,
    Image,
    #[serde(other)]
    Other,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Chat => "chat",
            ModelType::Embedding => "embedding",
            ModelType::Rerank => "rerank",
            ModelType::Image => "image",
            ModelType::Other => "other",
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat" => Ok(ModelType::Chat),
            "embedding" => Ok(ModelType::Embedding),
            "rerank" => Ok(ModelType::Rerank),
            "image" => Ok(ModelType::Image),
            _ => Err(format!(
                "Invalid model type: {}. Valid types: chat, embedding, rerank, image",
                s
            )),
        }
    }
}

/// Serving status of a registered model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Active,
    Inactive,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ModelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelStatus::Active => "active",
            ModelStatus::Inactive => "inactive",
            ModelStatus::Error => "error",
            ModelStatus::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for ModelStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ModelStatus::Active),
            "inactive" => Ok(ModelStatus::Inactive),
            _ => Err(format!("Invalid model status: {}. Valid: active, inactive", s)),
        }
    }
}

/// A registered model definition
///
/// The API key is write-only: the backend only reports whether one is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub model_type: ModelType,
    #[serde(default)]
    pub factory: String,
    #[serde(default)]
    pub status: ModelStatus,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub api_key_set: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// The registry listing: either a flat array or grouped by category
/// (`llm`, `chat`, `embedding`, `rerank`, `image`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ModelListing {
    Flat(Vec<Model>),
    Grouped(BTreeMap<String, Vec<Model>>),
}

impl ModelListing {
    /// Flatten into a single list, keeping group order stable
    pub fn into_models(self) -> Vec<Model> {
        match self {
            ModelListing::Flat(models) => models,
            ModelListing::Grouped(groups) => groups.into_values().flatten().collect(),
        }
    }
}

/// Body for registering or updating a model
#[derive(Clone, Serialize, Default)]
pub struct ModelInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_type: Option<ModelType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ModelStatus>,
}

impl std::fmt::Debug for ModelInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelInput")
            .field("name", &self.name)
            .field("model_type", &self.model_type)
            .field("factory", &self.factory)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("status", &self.status)
            .finish()
    }
}

/// Acknowledgement returned by registry and version mutations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationAck {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl MutationAck {
    pub fn id_string(&self) -> Option<String> {
        self.id.as_ref().map(id_text)
    }
}

/// Render a JSON id or timestamp without quotes; `null` is empty
pub fn id_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ============================================================================
// Benchmarks
// ============================================================================

/// Which benchmark to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    Latency,
    Quality,
    Throughput,
    #[serde(other)]
    Other,
}

impl TestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::Latency => "latency",
            TestType::Quality => "quality",
            TestType::Throughput => "throughput",
            TestType::Other => "other",
        }
    }
}

impl std::fmt::Display for TestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "latency" => Ok(TestType::Latency),
            "quality" => Ok(TestType::Quality),
            "throughput" => Ok(TestType::Throughput),
            _ => Err(format!(
                "Invalid test type: {}. Valid types: latency, quality, throughput",
                s
            )),
        }
    }
}

/// Lifecycle of a benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Unknown => "unknown",
        }
    }
}

/// One benchmark run; `results` is shaped by `test_type`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRun {
    pub id: serde_json::Value,
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub model_name: String,
    pub test_type: TestType,
    pub status: RunStatus,
    #[serde(default)]
    pub results: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

impl BenchmarkRun {
    /// Numeric result field, if the run completed and reported it
    pub fn result_f64(&self, field: &str) -> Option<f64> {
        if self.status != RunStatus::Completed {
            return None;
        }
        self.results.as_ref()?.get(field)?.as_f64()
    }

    /// Run id as displayed and compared (backend uses integers)
    pub fn id_string(&self) -> String {
        id_text(&self.id)
    }
}

/// Request to start a benchmark
#[derive(Debug, Clone, Serialize)]
pub struct RunBenchmarkRequest {
    pub test_type: TestType,
}

/// Benchmark listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkList {
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkRun>,
    #[serde(default)]
    pub total: usize,
}

/// Request to compare models
#[derive(Debug, Clone, Serialize)]
pub struct CompareRequest {
    pub model_ids: Vec<String>,
}

/// Latest benchmark figures for one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelScore {
    pub id: String,
    pub name: String,
    pub latency: Option<f64>,
    pub quality: Option<f64>,
    pub throughput: Option<f64>,
}

/// Comparison across models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelComparison {
    #[serde(default)]
    pub models: Vec<ModelScore>,
}

// ============================================================================
// Versions
// ============================================================================

/// One entry of a model's version history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub id: i64,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub created_by: String,
}

/// Version listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionList {
    #[serde(default)]
    pub versions: Vec<ModelVersion>,
    #[serde(default)]
    pub total: usize,
}

/// Request to append a version
#[derive(Debug, Clone, Serialize)]
pub struct CreateVersionRequest {
    pub version: String,
    pub description: String,
    pub created_by: String,
}

// ============================================================================
// Dashboard
// ============================================================================

/// Aggregate counters and series computed by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardMetrics {
    pub total_users: u64,
    #[serde(rename = "activeUsers24h")]
    pub active_users_24h: u64,
    #[serde(rename = "activeUsers7d")]
    pub active_users_7d: u64,
    #[serde(rename = "newUsers30d")]
    pub new_users_30d: u64,
    pub total_knowledge_bases: u64,
    pub total_conversations: u64,
    #[serde(rename = "activeConversations7d")]
    pub active_conversations_7d: u64,
    pub total_documents: u64,
    #[serde(rename = "documentsProcessed7d")]
    pub documents_processed_7d: u64,
    pub active_agents: u64,
    pub active_services: u64,
    pub total_services: u64,
    pub user_activity: Vec<ActivityPoint>,
    pub api_usage: Vec<ApiUsagePoint>,
    pub storage_usage: Vec<StorageSlice>,
    pub recent_activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPoint {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiUsagePoint {
    pub date: String,
    pub requests: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSlice {
    pub category: String,
    pub value: f64,
}

/// Kind of event in the recent-activity feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    UserCreated,
    DocumentUploaded,
    Conversation,
    SettingsChanged,
    UserDeleted,
    #[serde(other)]
    Unknown,
}

/// One entry of the recent-activity feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timestamp: String,
}

// Accepts `true`/`false`, `"1"`/`"0"` and `1`/`0`; older backends store
// flags as strings.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Str(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(i) => Ok(i != 0),
        Flag::Str(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Ok(true),
            "0" | "false" | "off" | "no" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!("invalid flag '{}'", other))),
        },
    }
}

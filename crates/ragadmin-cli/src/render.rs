//! Terminal presentation
//!
//! Formatting for benchmark results, labels, the activity feed and the
//! tables printed by the commands.

use crate::api::{
    id_text, is_system_role, Activity, ActivityKind, BenchmarkRun, DashboardMetrics, Model,
    ModelComparison, ModelStatus, PermissionAction, Role, RolePermissions, RunStatus, TestType,
    User, UserDetail,
};
use crate::workflow::{Selection, VersionHistory};
use chrono::{DateTime, NaiveDateTime, Utc};
use colored::{Color, Colorize};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};

/// Shown wherever a value is missing or not yet meaningful
pub const PLACEHOLDER: &str = "-";

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);
    table
}

// ============================================================================
// Benchmarks
// ============================================================================

/// One-line summary of a run's results, or `-` unless it completed
pub fn benchmark_summary(run: &BenchmarkRun) -> String {
    let summary = match run.test_type {
        TestType::Latency => run
            .result_f64("avg_latency_ms")
            .map(|ms| format!("Avg: {:.2}ms", ms)),
        TestType::Quality => run
            .result_f64("overall_score")
            .map(|score| format!("Score: {:.1}%", score * 100.0)),
        TestType::Throughput => run
            .result_f64("requests_per_second")
            .map(|rps| format!("{:.1} req/s", rps)),
        TestType::Other => None,
    };
    summary.unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn run_status_color(status: RunStatus) -> Color {
    match status {
        RunStatus::Completed => Color::Green,
        RunStatus::Running => Color::Blue,
        RunStatus::Failed => Color::Red,
        RunStatus::Unknown => Color::White,
    }
}

pub fn model_status_color(status: ModelStatus) -> Color {
    match status {
        ModelStatus::Active => Color::Green,
        ModelStatus::Inactive => Color::White,
        ModelStatus::Error => Color::Red,
        ModelStatus::Unknown => Color::Yellow,
    }
}

pub fn benchmarks_table(runs: &[BenchmarkRun]) -> Table {
    let mut table = table(vec!["ID", "Model", "Test", "Status", "Results", "Time"]);
    for run in runs {
        let model = if run.model_name.is_empty() {
            run.model_id.clone()
        } else {
            run.model_name.clone()
        };
        table.add_row(vec![
            run.id_string(),
            model,
            run.test_type.to_string(),
            run.status
                .as_str()
                .color(run_status_color(run.status))
                .to_string(),
            benchmark_summary(run),
            run.timestamp.clone(),
        ]);
    }
    table
}

pub fn comparison_table(comparison: &ModelComparison) -> Table {
    fn cell(value: Option<f64>, render: impl Fn(f64) -> String) -> String {
        value.map(render).unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    let mut table = table(vec!["ID", "Name", "Latency", "Quality", "Throughput"]);
    for model in &comparison.models {
        table.add_row(vec![
            model.id.clone(),
            model.name.clone(),
            cell(model.latency, |ms| format!("{:.2}ms", ms)),
            cell(model.quality, |q| format!("{:.1}%", q * 100.0)),
            cell(model.throughput, |rps| format!("{:.1} req/s", rps)),
        ]);
    }
    table
}

// ============================================================================
// Models and versions
// ============================================================================

pub fn models_table(models: &[Model]) -> Table {
    let mut table = table(vec!["ID", "Name", "Type", "Factory", "Status"]);
    for model in models {
        table.add_row(vec![
            model.id.clone(),
            model.name.clone(),
            model.model_type.to_string(),
            model.factory.clone(),
            model
                .status
                .as_str()
                .color(model_status_color(model.status))
                .to_string(),
        ]);
    }
    table
}

pub fn model_detail_table(model: &Model) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);

    table.add_row(vec!["ID", &model.id]);
    table.add_row(vec!["Name", &model.name]);
    table.add_row(vec!["Type", model.model_type.as_str()]);
    table.add_row(vec!["Factory", &model.factory]);
    table.add_row(vec!["Status", model.status.as_str()]);
    table.add_row(vec!["API base", model.api_base.as_deref().unwrap_or(PLACEHOLDER)]);
    let key = match model.api_key_set {
        Some(true) => "set",
        Some(false) => "not set",
        None => PLACEHOLDER,
    };
    table.add_row(vec!["API key", key]);
    if let Some(ref created) = model.created_at {
        table.add_row(vec!["Created", created]);
    }
    if let Some(ref updated) = model.updated_at {
        table.add_row(vec!["Updated", updated]);
    }
    table
}

pub fn versions_table(history: &VersionHistory) -> Table {
    let mut table = table(vec!["ID", "Version", "Description", "Active", "Created", "By"]);
    for v in history.versions() {
        let active = if v.is_active {
            "●".green().to_string()
        } else {
            String::new()
        };
        table.add_row(vec![
            v.id.to_string(),
            v.version.clone(),
            v.description.clone(),
            active,
            v.created_at.clone(),
            v.created_by.clone(),
        ]);
    }
    table
}

// ============================================================================
// Users
// ============================================================================

pub fn status_label(active: bool) -> &'static str {
    if active {
        "Active"
    } else {
        "Inactive"
    }
}

pub fn role_label(superuser: bool) -> &'static str {
    if superuser {
        "Admin"
    } else {
        "User"
    }
}

pub fn users_table(users: &[User], selection: &Selection) -> Table {
    let mut table = table(vec!["", "Email", "Nickname", "Role", "Status", "Created", "Last Login"]);
    for user in users {
        let status = if user.is_active {
            user.status_label().green()
        } else {
            user.status_label().red()
        };
        let role = if user.is_superuser {
            user.role_label().magenta()
        } else {
            user.role_label().normal()
        };
        table.add_row(vec![
            if selection.contains(&user.email) { "✓" } else { "" }.to_string(),
            user.email.clone(),
            user.nickname.clone(),
            role.to_string(),
            status.to_string(),
            user.create_date.clone(),
            user.last_login_time
                .clone()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        ]);
    }
    table
}

pub fn user_detail_table(user: &UserDetail) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);

    let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| PLACEHOLDER.to_string());
    table.add_row(vec!["Email".to_string(), user.email.clone()]);
    table.add_row(vec!["Nickname".to_string(), user.nickname.clone()]);
    table.add_row(vec!["Role".to_string(), role_label(user.is_superuser).to_string()]);
    table.add_row(vec!["Status".to_string(), status_label(user.is_active).to_string()]);
    table.add_row(vec!["Language".to_string(), or_dash(&user.language)]);
    table.add_row(vec!["Login channel".to_string(), or_dash(&user.login_channel)]);
    table.add_row(vec!["Created".to_string(), user.create_date.clone()]);
    table.add_row(vec!["Updated".to_string(), or_dash(&user.update_date)]);
    table.add_row(vec!["Last login".to_string(), or_dash(&user.last_login_time)]);
    table
}

// ============================================================================
// Roles
// ============================================================================

/// Role timestamps arrive as epoch millis or preformatted strings
pub fn role_date(value: &serde_json::Value) -> String {
    if let Some(millis) = value.as_i64() {
        return DateTime::from_timestamp_millis(millis)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| millis.to_string());
    }
    match id_text(value) {
        text if text.is_empty() => PLACEHOLDER.to_string(),
        text => text,
    }
}

pub fn roles_table(roles: &[Role]) -> Table {
    let mut table = table(vec!["Name", "Description", "Created", "Updated"]);
    for role in roles {
        let name = if is_system_role(&role.role_name) {
            format!("{} {}", role.role_name, "(built-in)".dimmed())
        } else {
            role.role_name.clone()
        };
        table.add_row(vec![
            name,
            role.description
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            role_date(&role.create_date),
            role_date(&role.update_date),
        ]);
    }
    table
}

/// One row per resource type, one column per action
pub fn permissions_table(permissions: &RolePermissions) -> Table {
    let mut header = vec!["Resource"];
    header.extend(PermissionAction::ALL.iter().map(|a| a.as_str()));
    let mut table = table(header);
    for (resource, set) in &permissions.permissions {
        let mut row = vec![resource.clone()];
        for action in PermissionAction::ALL {
            row.push(if set.allows(action) {
                "✓".green().to_string()
            } else {
                PLACEHOLDER.to_string()
            });
        }
        table.add_row(row);
    }
    table
}

// ============================================================================
// Dashboard
// ============================================================================

/// How an activity type is drawn in the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityStyle {
    pub icon: &'static str,
    pub color: Color,
    pub label: String,
}

pub fn activity_style(kind: ActivityKind) -> ActivityStyle {
    let (icon, color, raw) = match kind {
        ActivityKind::UserCreated => ("+", Color::Green, "user_created"),
        ActivityKind::DocumentUploaded => ("↑", Color::Blue, "document_uploaded"),
        ActivityKind::Conversation => ("✉", Color::Magenta, "conversation"),
        ActivityKind::SettingsChanged => ("⚙", Color::Yellow, "settings_changed"),
        ActivityKind::UserDeleted => ("✗", Color::Red, "user_deleted"),
        ActivityKind::Unknown => ("⚙", Color::White, "activity"),
    };
    ActivityStyle {
        icon,
        color,
        label: raw.replace('_', " "),
    }
}

pub fn activity_line(activity: &Activity, now: DateTime<Utc>) -> String {
    let style = activity_style(activity.kind);
    format!(
        "{} {} [{}] {} · {}",
        style.icon.color(style.color),
        activity.description,
        style.label.color(style.color),
        activity.user.dimmed(),
        relative_time(&activity.timestamp, now)
    )
}

pub fn metrics_table(metrics: &DashboardMetrics) -> Table {
    let mut table = table(vec!["Metric", "Value"]);
    let rows: [(&str, String); 12] = [
        ("Total users", metrics.total_users.to_string()),
        ("Active users (24h)", metrics.active_users_24h.to_string()),
        ("Active users (7d)", metrics.active_users_7d.to_string()),
        ("New users (30d)", metrics.new_users_30d.to_string()),
        ("Knowledge bases", metrics.total_knowledge_bases.to_string()),
        ("Conversations", metrics.total_conversations.to_string()),
        ("Active conversations (7d)", metrics.active_conversations_7d.to_string()),
        ("Documents", metrics.total_documents.to_string()),
        ("Documents processed (7d)", metrics.documents_processed_7d.to_string()),
        ("Active agents", metrics.active_agents.to_string()),
        ("Active services", metrics.active_services.to_string()),
        ("Total services", metrics.total_services.to_string()),
    ];
    for (name, value) in rows {
        table.add_row(vec![name.to_string(), value]);
    }
    table
}

// ============================================================================
// Time
// ============================================================================

/// Parse the timestamp shapes the backend emits
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// "5 minutes ago" style distance; unparsable input is returned unchanged
pub fn relative_time(raw: &str, now: DateTime<Utc>) -> String {
    let Some(then) = parse_timestamp(raw) else {
        return raw.to_string();
    };
    let delta = now.signed_duration_since(then);
    let future = delta.num_seconds() < 0;
    let secs = delta.num_seconds().unsigned_abs();

    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };

    let distance = match secs {
        0..=59 => "less than a minute".to_string(),
        60..=3_599 => plural(secs / 60, "minute"),
        3_600..=86_399 => format!("about {}", plural(secs / 3_600, "hour")),
        86_400..=2_591_999 => plural(secs / 86_400, "day"),
        2_592_000..=31_535_999 => plural(secs / 2_592_000, "month"),
        _ => format!("about {}", plural(secs / 31_536_000, "year")),
    };

    if future {
        format!("in {}", distance)
    } else {
        format!("{} ago", distance)
    }
}

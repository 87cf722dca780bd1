//! User directory workflow
//!
//! List, create, switch on/off, reset password, change role and delete users,
//! plus confirmation-gated bulk actions over a selection and CSV import. Every mutation that
//! changes the directory invalidates [`QueryKey::Users`].

use crate::api::{AdminApi, User, UserDetail};
use crate::cache::{QueryCache, QueryKey};
use crate::error::{CliError, Result};
use crate::import::ImportRow;
use crate::workflow::dialog::MutationGuard;
use chrono::NaiveDate;
use futures::future::join_all;
use ragadmin_common::validation;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Refetch interval for the user list
pub const USERS_POLL_INTERVAL: Duration = Duration::from_secs(10);

// ============================================================================
// Filters
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleFilter {
    Admin,
    User,
}

impl FromStr for RoleFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(RoleFilter::Admin),
            "user" => Ok(RoleFilter::User),
            _ => Err(format!("Invalid role: {}. Valid roles: admin, user", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Active,
    Inactive,
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(StatusFilter::Active),
            "inactive" => Ok(StatusFilter::Inactive),
            _ => Err(format!("Invalid status: {}. Valid: active, inactive", s)),
        }
    }
}

/// Client-side narrowing of the user list
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive match against email or nickname
    pub search: Option<String>,
    pub role: Option<RoleFilter>,
    pub status: Option<StatusFilter>,
    /// Inclusive lower bound on the creation date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the creation date
    pub to: Option<NaiveDate>,
}

impl UserFilter {
    pub fn is_empty(&self) -> bool {
        self.search.as_deref().is_none_or(|s| s.trim().is_empty())
            && self.role.is_none()
            && self.status.is_none()
            && self.from.is_none()
            && self.to.is_none()
    }

    pub fn matches(&self, user: &User) -> bool {
        if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            if !user.email.to_lowercase().contains(&needle)
                && !user.nickname.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        match self.role {
            Some(RoleFilter::Admin) if !user.is_superuser => return false,
            Some(RoleFilter::User) if user.is_superuser => return false,
            _ => {},
        }

        match self.status {
            Some(StatusFilter::Active) if !user.is_active => return false,
            Some(StatusFilter::Inactive) if user.is_active => return false,
            _ => {},
        }

        if self.from.is_some() || self.to.is_some() {
            let Some(created) = creation_date(&user.create_date) else {
                return false;
            };
            if self.from.is_some_and(|from| created < from) {
                return false;
            }
            if self.to.is_some_and(|to| created > to) {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, users: &[User]) -> Vec<User> {
        users.iter().filter(|u| self.matches(u)).cloned().collect()
    }
}

// The backend formats dates as `YYYY-MM-DD HH:MM:SS` or RFC 3339; only the
// calendar day matters for filtering.
fn creation_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    validation::parse_date(day).ok()
}

// ============================================================================
// Selection
// ============================================================================

/// Ordered set of selected user emails
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    emails: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an email; returns false if it was already selected
    pub fn insert(&mut self, email: impl Into<String>) -> bool {
        let email = email.into();
        if self.contains(&email) {
            return false;
        }
        self.emails.push(email);
        true
    }

    pub fn remove(&mut self, email: &str) -> bool {
        let before = self.emails.len();
        self.emails.retain(|e| e != email);
        before != self.emails.len()
    }

    pub fn toggle(&mut self, email: &str) {
        if !self.remove(email) {
            self.emails.push(email.to_string());
        }
    }

    /// Select every row currently shown
    pub fn select_all(&mut self, users: &[User]) {
        for user in users {
            self.insert(user.email.clone());
        }
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.iter().any(|e| e == email)
    }

    pub fn clear(&mut self) {
        self.emails.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.emails.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut selection = Selection::new();
        for email in iter {
            selection.insert(email);
        }
        selection
    }
}

// ============================================================================
// Bulk actions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Activate,
    Deactivate,
    Delete,
}

impl BulkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::Activate => "activate",
            BulkAction::Deactivate => "deactivate",
            BulkAction::Delete => "delete",
        }
    }

    /// Guard key shared with the single-user operation on `email`
    fn guard_key(&self, email: &str) -> String {
        match self {
            BulkAction::Activate | BulkAction::Deactivate => status_key(email),
            BulkAction::Delete => delete_key(email),
        }
    }
}

fn create_key(email: &str) -> String {
    format!("create:{}", email)
}

fn status_key(email: &str) -> String {
    format!("status:{}", email)
}

fn delete_key(email: &str) -> String {
    format!("delete:{}", email)
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BulkAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "activate" => Ok(BulkAction::Activate),
            "deactivate" => Ok(BulkAction::Deactivate),
            "delete" => Ok(BulkAction::Delete),
            _ => Err(format!(
                "Invalid bulk action: {}. Valid: activate, deactivate, delete",
                s
            )),
        }
    }
}

/// Per-email outcome of a bulk action or import
#[derive(Debug, Clone)]
pub struct BulkReport {
    pub action: String,
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl BulkReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Surface partial failure as [`CliError::BulkPartial`]
    pub fn into_result(self) -> Result<Self> {
        if self.failed.is_empty() {
            return Ok(self);
        }
        let details = self
            .failed
            .iter()
            .map(|(email, reason)| format!("{}: {}", email, reason))
            .collect::<Vec<_>>()
            .join("; ");
        let total = self.total();
        Err(CliError::BulkPartial {
            action: self.action,
            failed: self.failed.len(),
            total,
            details,
        })
    }
}

// ============================================================================
// Workflow
// ============================================================================

/// User directory operations over an [`AdminApi`]
#[derive(Clone)]
pub struct UserDirectory {
    api: Arc<dyn AdminApi>,
    cache: QueryCache,
    guard: MutationGuard,
}

impl UserDirectory {
    pub fn new(api: Arc<dyn AdminApi>, cache: QueryCache) -> Self {
        Self {
            api,
            cache,
            guard: MutationGuard::new(),
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// All users, served from cache while fresh
    pub async fn list(&self) -> Result<Vec<User>> {
        self.cache
            .fetch_with(QueryKey::Users, || self.api.list_users())
            .await
    }

    /// Fetch the list from the backend regardless of cache freshness
    pub async fn refresh(&self) -> Result<Vec<User>> {
        self.cache
            .refetch(QueryKey::Users, || self.api.list_users())
            .await
    }

    pub async fn detail(&self, email: &str) -> Result<UserDetail> {
        self.cache
            .fetch_with(QueryKey::UserDetail(email.to_string()), || {
                self.api.get_user(email)
            })
            .await
    }

    /// Register a user after validating email, password and confirmation
    pub async fn create(
        &self,
        email: &str,
        password: &str,
        confirm: &str,
        role: &str,
    ) -> Result<()> {
        let email = email.trim();
        validation::validate_email(email)?;
        validation::validate_password(password, Some(confirm))?;
        validation::require("role", role)?;

        self.guard
            .run(create_key(email), self.api.create_user(email, password, role.trim()))
            .await?;
        info!(email = %email, role = %role.trim(), "Created user");
        self.cache.invalidate(QueryKey::Users).await;
        Ok(())
    }

    /// Switch a user on or off; the call is issued even if already in that state
    pub async fn set_status(&self, email: &str, active: bool) -> Result<()> {
        self.guard
            .run(status_key(email), self.api.set_user_status(email, active))
            .await?;
        info!(email = %email, active, "Changed user status");
        self.cache.invalidate(QueryKey::Users).await;
        Ok(())
    }

    pub async fn set_password(&self, email: &str, password: &str, confirm: &str) -> Result<()> {
        validation::validate_password(password, Some(confirm))?;
        self.guard
            .run(
                format!("password:{}", email),
                self.api.set_user_password(email, password),
            )
            .await?;
        info!(email = %email, "Changed user password");
        Ok(())
    }

    /// Move a user to another role
    pub async fn set_role(&self, email: &str, role: &str) -> Result<()> {
        let email = email.trim();
        validation::validate_email(email)?;
        validation::require("role", role)?;
        self.guard
            .run(format!("role:{}", email), self.api.set_user_role(email, role.trim()))
            .await?;
        info!(email = %email, role = %role.trim(), "Changed user role");
        self.cache.invalidate(QueryKey::Users).await;
        Ok(())
    }

    pub async fn delete(&self, email: &str, confirmed: bool) -> Result<()> {
        if !confirmed {
            return Err(CliError::ConfirmationRequired(format!("Deleting user {}", email)));
        }
        self.guard
            .run(delete_key(email), self.api.delete_user(email))
            .await?;
        info!(email = %email, "Deleted user");
        self.cache.invalidate(QueryKey::Users).await;
        Ok(())
    }

    /// Apply `action` to every selected email, one call each
    ///
    /// Calls that succeed are not undone when others fail. The selection is
    /// cleared only when every call succeeded.
    pub async fn bulk(
        &self,
        action: BulkAction,
        selection: &mut Selection,
        confirmed: bool,
    ) -> Result<BulkReport> {
        if selection.is_empty() {
            return Err(CliError::validation("selection", "Select at least one user"));
        }
        if !confirmed {
            return Err(CliError::ConfirmationRequired(format!(
                "Bulk {} of {} user(s)",
                action,
                selection.len()
            )));
        }

        let _pending = self.guard.begin(format!("bulk:{}", action))?;

        // Each email also holds its single-user key, so a bulk call and a
        // single call on the same user cannot overlap.
        let calls = selection.iter().map(|email| async move {
            let call = async {
                match action {
                    BulkAction::Activate => self.api.set_user_status(email, true).await,
                    BulkAction::Deactivate => self.api.set_user_status(email, false).await,
                    BulkAction::Delete => self.api.delete_user(email).await,
                }
            };
            let outcome = self.guard.run(action.guard_key(email), call).await;
            (email.to_string(), outcome)
        });

        let mut report = BulkReport {
            action: action.to_string(),
            succeeded: Vec::new(),
            failed: Vec::new(),
        };
        for (email, outcome) in join_all(calls).await {
            match outcome {
                Ok(()) => report.succeeded.push(email),
                Err(e) => {
                    warn!(email = %email, action = %action, error = %e, "Bulk call failed");
                    report.failed.push((email, e.to_string()));
                },
            }
        }

        if !report.succeeded.is_empty() {
            self.cache.invalidate(QueryKey::Users).await;
        }
        if report.is_complete_success() {
            selection.clear();
        }

        info!(
            action = %action,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Bulk action finished"
        );
        Ok(report)
    }

    /// Create one user per imported row
    ///
    /// Rows that fail validation or repeat an earlier email are reported as
    /// failed without a request. The rest are created concurrently.
    pub async fn import(&self, rows: Vec<ImportRow>) -> Result<BulkReport> {
        if rows.is_empty() {
            return Err(CliError::validation("file", "The import file has no user rows"));
        }

        let _pending = self.guard.begin("bulk:import")?;

        let mut report = BulkReport {
            action: "import".to_string(),
            succeeded: Vec::new(),
            failed: Vec::new(),
        };
        let mut seen = Selection::new();
        let mut accepted = Vec::new();
        for row in rows {
            if let Err(reason) = row.check() {
                report.failed.push((row.email, reason));
                continue;
            }
            if !seen.insert(row.email.clone()) {
                report.failed.push((row.email, "Duplicate email in file".to_string()));
                continue;
            }
            accepted.push(row);
        }

        let calls = accepted.iter().map(|row| async move {
            let outcome = self
                .guard
                .run(
                    create_key(&row.email),
                    self.api.create_user(&row.email, &row.password, &row.role),
                )
                .await;
            (row.email.clone(), outcome)
        });
        for (email, outcome) in join_all(calls).await {
            match outcome {
                Ok(()) => report.succeeded.push(email),
                Err(e) => {
                    warn!(email = %email, error = %e, "Import row failed");
                    report.failed.push((email, e.to_string()));
                },
            }
        }

        if !report.succeeded.is_empty() {
            self.cache.invalidate(QueryKey::Users).await;
        }
        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Import finished"
        );
        Ok(report)
    }
}

//! Console workflows
//!
//! Each workflow validates input, calls the backend through [`AdminApi`],
//! and invalidates the affected query keys.
//!
//! [`AdminApi`]: crate::api::AdminApi

pub mod dashboard;
pub mod dialog;
pub mod models;
pub mod roles;
pub mod users;
pub mod versions;

#[cfg(test)]
pub(crate) mod testing;

pub use dashboard::Dashboard;
pub use dialog::{Dialog, DialogState, MutationGuard};
pub use models::ModelRegistry;
pub use roles::RoleManager;
pub use users::{BulkAction, BulkReport, Selection, UserDirectory, UserFilter};
pub use versions::{VersionControl, VersionHistory};

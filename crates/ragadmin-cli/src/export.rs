//! User export to CSV or JSON
//!
//! Exports the selected rows when anything is selected, otherwise every row
//! currently shown. Nothing is written for an empty row set.

use crate::api::User;
use crate::error::Result;
use crate::workflow::Selection;
use chrono::{NaiveDate, Utc};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// CSV column headers, in field order
pub const CSV_HEADER: [&str; 6] = [
    "Email",
    "Nickname",
    "Role",
    "Status",
    "Created Date",
    "Last Login",
];

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// `users_export_YYYY-MM-DD.<ext>`
    pub fn filename(&self, date: NaiveDate) -> String {
        format!("users_export_{}.{}", date.format("%Y-%m-%d"), self.extension())
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(format!("Invalid export format: {}. Valid formats: csv, json", s)),
        }
    }
}

/// Result of an export request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { path: PathBuf, rows: usize },
    /// No rows to export; no file was created
    Empty,
}

/// Selected rows if the selection is non-empty, otherwise all visible rows
pub fn effective_rows<'a>(visible: &'a [User], selection: &Selection) -> Vec<&'a User> {
    if selection.is_empty() {
        visible.iter().collect()
    } else {
        visible.iter().filter(|u| selection.contains(&u.email)).collect()
    }
}

/// Write the effective rows into `dir`, named for today's UTC date
pub fn export_users(
    visible: &[User],
    selection: &Selection,
    format: ExportFormat,
    dir: &Path,
) -> Result<ExportOutcome> {
    export_users_on(visible, selection, format, dir, Utc::now().date_naive())
}

pub fn export_users_on(
    visible: &[User],
    selection: &Selection,
    format: ExportFormat,
    dir: &Path,
    date: NaiveDate,
) -> Result<ExportOutcome> {
    let rows = effective_rows(visible, selection);
    if rows.is_empty() {
        warn!("No users to export");
        return Ok(ExportOutcome::Empty);
    }

    std::fs::create_dir_all(dir)?;
    let path = dir.join(format.filename(date));
    match format {
        ExportFormat::Csv => write_csv(&rows, &path)?,
        ExportFormat::Json => std::fs::write(&path, serde_json::to_string_pretty(&rows)?)?,
    }

    info!(path = %path.display(), rows = rows.len(), format = %format, "Exported users");
    Ok(ExportOutcome::Written {
        path,
        rows: rows.len(),
    })
}

fn write_csv(rows: &[&User], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CSV_HEADER)?;
    for user in rows {
        writer.write_record([
            user.email.as_str(),
            user.nickname.as_str(),
            user.role_label(),
            user.status_label(),
            user.create_date.as_str(),
            user.last_login_time.as_deref().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn user(email: &str, nickname: &str) -> User {
        User {
            email: email.into(),
            nickname: nickname.into(),
            is_active: true,
            is_superuser: false,
            create_date: "2024-01-02 03:04:05".into(),
            last_login_time: None,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_empty_export_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let outcome =
            export_users_on(&[], &Selection::new(), ExportFormat::Csv, temp.path(), date()).unwrap();
        assert_eq!(outcome, ExportOutcome::Empty);
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_csv_quotes_embedded_commas() {
        let temp = TempDir::new().unwrap();
        let rows = vec![user("a@x.com", "Smith, Jane"), user("b@x.com", "bob")];

        let outcome =
            export_users_on(&rows, &Selection::new(), ExportFormat::Csv, temp.path(), date()).unwrap();
        let ExportOutcome::Written { path, rows: count } = outcome else {
            panic!("expected a file");
        };
        assert_eq!(count, 2);
        assert!(path.ends_with("users_export_2024-06-01.csv"));

        let text = std::fs::read_to_string(path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "Email,Nickname,Role,Status,Created Date,Last Login");
        assert_eq!(
            lines.next().unwrap(),
            "a@x.com,\"Smith, Jane\",User,Active,2024-01-02 03:04:05,"
        );
    }

    #[test]
    fn test_selection_narrows_rows() {
        let temp = TempDir::new().unwrap();
        let rows = vec![user("a@x.com", "a"), user("b@x.com", "b")];
        let selection: Selection = ["b@x.com"].into_iter().collect();

        let outcome =
            export_users_on(&rows, &selection, ExportFormat::Json, temp.path(), date()).unwrap();
        let ExportOutcome::Written { path, .. } = outcome else {
            panic!("expected a file");
        };
        let exported: Vec<User> = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].email, "b@x.com");
    }
}

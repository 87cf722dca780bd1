//! User import from CSV
//!
//! The file carries an `Email,Password,Role` header. `Role` may be omitted
//! and defaults to `user`. Rows are checked individually so one bad line
//! does not abort the rest of the file.

use crate::api::DEFAULT_USER_ROLE;
use crate::error::Result;
use ragadmin_common::validation;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// One user to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub email: String,
    pub password: String,
    pub role: String,
}

impl ImportRow {
    /// Row-level validation; the message becomes the row's failure reason
    pub fn check(&self) -> std::result::Result<(), String> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err("Email and password are required".to_string());
        }
        validation::validate_email(&self.email).map_err(|e| e.to_string())?;
        validation::validate_password(&self.password, None).map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Email", default)]
    email: String,
    #[serde(rename = "Password", default)]
    password: String,
    #[serde(rename = "Role", default)]
    role: Option<String>,
}

impl From<RawRow> for ImportRow {
    fn from(raw: RawRow) -> Self {
        let role = raw
            .role
            .map(|r| r.trim().to_lowercase())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_ROLE.to_string());
        Self {
            email: raw.email.trim().to_string(),
            password: raw.password,
            role,
        }
    }
}

pub fn read_import(path: &Path) -> Result<Vec<ImportRow>> {
    let file = std::fs::File::open(path)?;
    let rows = parse_import(file)?;
    debug!(path = %path.display(), rows = rows.len(), "Read import file");
    Ok(rows)
}

pub fn parse_import<R: Read>(reader: R) -> Result<Vec<ImportRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in reader.deserialize::<RawRow>() {
        rows.push(record?.into());
    }
    Ok(rows)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_role_defaults_and_lowercases() {
        let text = "Email,Password,Role\na@x.com,secret1,Admin\n b@x.com ,secret2,\n";
        let rows = parse_import(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].role, "admin");
        assert_eq!(rows[1].email, "b@x.com");
        assert_eq!(rows[1].role, "user");
    }

    #[test]
    fn test_missing_role_column() {
        let rows = parse_import("Email,Password\na@x.com,secret1\n".as_bytes()).unwrap();
        assert_eq!(rows[0].role, "user");
        assert!(rows[0].check().is_ok());
    }

    #[test]
    fn test_row_checks() {
        let rows = parse_import("Email,Password\n,secret1\nc@x.com,\nbad,secret1\nd@x.com,abc\n".as_bytes())
            .unwrap();
        assert_eq!(rows[0].check().unwrap_err(), "Email and password are required");
        assert_eq!(rows[1].check().unwrap_err(), "Email and password are required");
        assert!(rows[2].check().unwrap_err().contains("email"));
        assert!(rows[3].check().unwrap_err().contains("6 characters"));
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = read_import(&temp.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, crate::error::CliError::Io(_)));
    }
}

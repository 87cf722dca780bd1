//! Client-side form validation
//!
//! These checks run before a request is built. A value that fails here never
//! reaches the network.

use crate::error::{CommonError, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LEN: usize = 6;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
            .expect("email pattern is valid")
    })
}

/// Check that an email address is present and well formed
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(CommonError::invalid_field("email", "Please input email"));
    }
    if !email_regex().is_match(email) {
        return Err(CommonError::invalid_field(
            "email",
            format!("'{}' is not a valid email", email),
        ));
    }
    Ok(())
}

/// Check password length and, when given, that the confirmation matches
pub fn validate_password(password: &str, confirmation: Option<&str>) -> Result<()> {
    if password.is_empty() {
        return Err(CommonError::invalid_field("password", "Please input password"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CommonError::invalid_field(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    if let Some(confirm) = confirmation {
        if confirm != password {
            return Err(CommonError::invalid_field(
                "confirm_password",
                "Passwords do not match",
            ));
        }
    }
    Ok(())
}

/// Reject blank values for required fields
pub fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CommonError::invalid_field(
            field,
            format!("Please enter {}", field.replace('_', " ")),
        ));
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| CommonError::InvalidDate(value.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
    }

    #[test]
    fn test_invalid_emails() {
        for bad in ["", "   ", "plain", "a@", "@x.com", "a@x", "a b@x.com"] {
            let err = validate_email(bad).unwrap_err();
            assert_eq!(err.field(), Some("email"), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_password_length_boundary() {
        assert!(validate_password("12345", None).is_err());
        assert!(validate_password("123456", None).is_ok());
        assert!(validate_password("", None).is_err());
    }

    #[test]
    fn test_password_confirmation() {
        let err = validate_password("secret1", Some("secret2")).unwrap_err();
        assert_eq!(err.field(), Some("confirm_password"));
        assert!(validate_password("secret1", Some("secret1")).is_ok());
    }

    #[test]
    fn test_require() {
        assert!(require("model_name", "llama3:8b").is_ok());
        let err = require("model_name", "  ").unwrap_err();
        assert_eq!(err.to_string(), "model_name: Please enter model name");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-09").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
        );
        assert!(matches!(parse_date("03/09/2024"), Err(CommonError::InvalidDate(_))));
    }
}

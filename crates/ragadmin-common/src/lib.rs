//! ragadmin common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared pieces for the ragadmin workspace:
//!
//! - **Logging**: `tracing` subscriber setup driven by [`logging::LogConfig`]
//! - **Validation**: client-side form rules applied before any request is sent
//! - **Errors**: [`CommonError`] for the above

pub mod error;
pub mod logging;
pub mod validation;

pub use error::{CommonError, Result};

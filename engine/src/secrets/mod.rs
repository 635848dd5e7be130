//! Secret handling
//!
//! API keys are read from the environment and wrapped in `SecretString`,
//! which never prints its contents through `Debug` or `Display`. A `.env`
//! file can supply them; variables already set in the process win.

use sdk::errors::TutorError;
use std::fmt;
use std::path::{Path, PathBuf};

/// A wrapper for sensitive string data that prevents accidental logging.
///
/// It implements `Debug` and `Display` to always print `[REDACTED]`.
/// To access the actual secret value, use the `unsecure()` method.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new SecretString
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Access the raw underlying string
    pub fn unsecure(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Load a `.env` file from the working directory or one of its parents
pub fn load_dotenv() -> Option<PathBuf> {
    report_dotenv(dotenvy::dotenv())
}

/// Load variables from the env file at `path`
pub fn load_dotenv_from(path: &Path) -> Option<PathBuf> {
    report_dotenv(dotenvy::from_path(path).map(|()| path.to_path_buf()))
}

fn report_dotenv(result: dotenvy::Result<PathBuf>) -> Option<PathBuf> {
    match result {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!("Ignoring unreadable env file: {}", e);
            None
        }
    }
}

/// Read a secret from the environment variable `var`
///
/// # Errors
/// Returns `TutorError::Config` if the variable is unset or blank
pub fn secret_from_env(var: &str) -> Result<SecretString, TutorError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => {
            tracing::debug!("Loaded secret from ${}", var);
            Ok(SecretString::new(value.trim()))
        }
        _ => Err(TutorError::Config(format!(
            "Environment variable {} is not set",
            var
        ))),
    }
}

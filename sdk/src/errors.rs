//! Error types and handling
//!
//! This module provides the error types used throughout the tutor engine.
//! All errors implement the `TutorErrorExt` trait which provides user-friendly
//! hints, indicates whether errors are recoverable, and maps each error to
//! the HTTP status code the chat endpoint reports.
//!
//! # Security
//!
//! Hints never include API keys, file paths or raw provider payloads.
//! The `Display` text of provider errors is still returned as the `detail`
//! of a 500 response, matching the chat endpoint contract.

use thiserror::Error;

/// Trait for tutor error extensions
pub trait TutorErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain
    /// secrets, file paths or provider payloads.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried by the caller without changing the
    /// request (e.g. a transient provider failure during evaluation leaves the
    /// thread resumable).
    fn is_recoverable(&self) -> bool;

    /// HTTP status code reported by the chat endpoint for this error
    fn status_code(&self) -> u16;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Store**: Thread persistence failures
/// - **LLM Provider**: API failures, authentication errors, timeouts
/// - **Thread lifecycle**: Unknown threads, finished threads, illegal transitions
/// - **Input**: Malformed request payloads
///
/// # Examples
///
/// ```
/// use sdk::errors::{TutorError, TutorErrorExt};
///
/// let error = TutorError::ThreadNotFound("abc".to_string());
/// assert_eq!(error.status_code(), 404);
/// assert!(!error.is_recoverable());
///
/// let transient = TutorError::LLMProvider("Rate limit exceeded".to_string());
/// assert_eq!(transient.status_code(), 500);
/// assert!(transient.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum TutorError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Store errors
    #[error("Store error: {0}")]
    Store(String),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    // Thread lifecycle errors
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Thread already complete: {0}")]
    ThreadComplete(String),

    #[error("Thread already exists: {0}")]
    ThreadExists(String),

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    // Input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TutorErrorExt for TutorError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Store(_) => "Conversation storage failed. Try again or restart the server",
            Self::LLMProvider(_) => "LLM provider unavailable. Check your API key and network",
            Self::ThreadNotFound(_) => "Unknown thread id. Start a new conversation without one",
            Self::ThreadComplete(_) => "This quiz is finished. Start a new conversation",
            Self::ThreadExists(_) => "Thread id already in use",
            Self::InvalidTransition { .. } => "The conversation is not in a state that allows this",
            Self::InvalidInput(_) => "The request was malformed",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Store(_) | Self::LLMProvider(_) | Self::Io(_) => true,

            Self::Config(_)
            | Self::ThreadNotFound(_)
            | Self::ThreadComplete(_)
            | Self::ThreadExists(_)
            | Self::InvalidTransition { .. }
            | Self::InvalidInput(_) => false,
        }
    }

    fn status_code(&self) -> u16 {
        match self {
            Self::ThreadNotFound(_) => 404,
            Self::ThreadComplete(_) | Self::ThreadExists(_) | Self::InvalidTransition { .. } => 409,
            Self::InvalidInput(_) => 400,
            Self::Config(_) | Self::Store(_) | Self::LLMProvider(_) | Self::Io(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(TutorError::ThreadNotFound("t".into()).status_code(), 404);
        assert_eq!(TutorError::ThreadComplete("t".into()).status_code(), 409);
        assert_eq!(TutorError::InvalidInput("bad".into()).status_code(), 400);
        assert_eq!(TutorError::LLMProvider("boom".into()).status_code(), 500);
        assert_eq!(TutorError::Store("disk".into()).status_code(), 500);
    }

    #[test]
    fn test_display_includes_detail() {
        let err = TutorError::LLMProvider("Network error: connection reset".into());
        assert_eq!(
            err.to_string(),
            "LLM provider error: Network error: connection reset"
        );

        let err = TutorError::InvalidTransition {
            from: "complete".into(),
            to: "evaluating".into(),
        };
        assert_eq!(err.to_string(), "Invalid transition from complete to evaluating");
    }
}

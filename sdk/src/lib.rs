//! Tutor SDK
//!
//! Shared library providing the chat wire types and error handling used by
//! the engine's HTTP server and by clients talking to it.

/// Error types and handling
pub mod errors;

/// Chat request/response types
pub mod types;

// Re-export commonly used types
pub use errors::{TutorError, TutorErrorExt};
pub use types::{ChatRequest, ChatResponse, ChatStatus, ErrorBody};

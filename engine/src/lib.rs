//! Tutor Engine Library
//!
//! Core of the language tutor: configuration, model providers, thread
//! storage, the quiz workflow and its HTTP surface. Used by the `tutor`
//! binary and by the integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// LLM provider abstraction layer
pub mod llm;

/// Conversation thread storage
pub mod store;

/// Quiz state machine and workflow
pub mod quiz;

/// HTTP server
pub mod server;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers
pub mod handlers;

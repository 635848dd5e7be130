//! LLM Provider Abstraction Layer
//!
//! This module provides a common interface for the text-generation services the
//! quiz talks to (Gemini, Ollama). The LLMProvider trait defines the contract
//! every provider implements: given a system instruction and the conversation
//! history, produce one assistant message.

use async_trait::async_trait;
use sdk::TutorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LLMConfig;
use crate::secrets::secret_from_env;

pub mod gemini;
pub mod ollama;
pub mod retry;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,
}

impl LLMError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LLMError::ProviderUnavailable(_)
                | LLMError::RateLimitExceeded
                | LLMError::NetworkError(_)
                | LLMError::Timeout
        )
    }
}

impl From<LLMError> for TutorError {
    fn from(err: LLMError) -> Self {
        TutorError::LLMProvider(err.to_string())
    }
}

/// Message in a conversation thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Role of the message sender (system, human, assistant)
    pub role: MessageRole,

    /// Text content of the message
    pub content: String,
}

impl Message {
    /// Create a new human message
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Human,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Fixed instruction for the model
    System,

    /// The learner
    Human,

    /// The model
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &str {
        match self {
            MessageRole::System => "system",
            MessageRole::Human => "human",
            MessageRole::Assistant => "assistant",
        }
    }

    /// Parse the stored form produced by `as_str`
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(MessageRole::System),
            "human" => Some(MessageRole::Human),
            "assistant" => Some(MessageRole::Assistant),
            _ => None,
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// LLM Provider trait that all providers must implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "gemini", "ollama")
    fn name(&self) -> &str;

    /// Returns true if this is a local provider (e.g., Ollama), false for cloud providers
    fn is_local(&self) -> bool;

    /// Generate the next assistant message
    ///
    /// # Arguments
    /// * `system_instruction` - Fixed instruction sent ahead of the history
    /// * `history` - Human and assistant messages in conversation order
    ///
    /// # Returns
    /// * `Ok(Message)` - An assistant message with non-empty content
    /// * `Err(LLMError)` - If the request fails
    async fn generate(&self, system_instruction: &str, history: &[Message]) -> Result<Message>;

    /// Check if the provider is currently healthy and available
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

/// Turn raw provider text into an assistant message, rejecting blank output
pub(crate) fn assistant_reply(text: String) -> Result<Message> {
    if text.trim().is_empty() {
        return Err(LLMError::EmptyResponse);
    }
    Ok(Message::assistant(text))
}

/// Build the provider selected by `config.provider`, wrapped in retries
///
/// # Errors
/// `TutorError::Config` for an unknown provider or a missing Gemini API key
pub fn build_provider(config: &LLMConfig) -> std::result::Result<Arc<dyn LLMProvider>, TutorError> {
    let timeout = Duration::from_secs(config.timeout_secs);

    let provider: Arc<dyn LLMProvider> = match config.provider.as_str() {
        "gemini" => {
            let api_key = secret_from_env(&config.gemini.api_key_env)?;
            Arc::new(gemini::GeminiProvider::new(
                config.gemini.clone(),
                api_key,
                timeout,
            )?)
        }
        "ollama" => Arc::new(ollama::OllamaProvider::new(
            &config.ollama.base_url,
            &config.ollama.model,
            timeout,
        )?),
        other => {
            return Err(TutorError::Config(format!(
                "Unknown LLM provider '{}'",
                other
            )))
        }
    };

    tracing::info!(
        "Using {} provider ({} retries)",
        provider.name(),
        config.max_retries
    );

    if config.max_retries == 0 {
        return Ok(provider);
    }

    let policy = retry::RetryPolicy::new(
        config.max_retries,
        Duration::from_millis(config.retry_base_delay_ms),
    );
    Ok(Arc::new(retry::RetryingProvider::new(provider, policy)))
}

//! Chat endpoint request/response types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /chat`
///
/// Both fields are optional. With no `thread_id` a new quiz is started;
/// with a `thread_id` and a `message` the suspended quiz is resumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl ChatRequest {
    /// Request that starts a new quiz
    pub fn start() -> Self {
        Self::default()
    }

    /// Request that answers the pending question of `thread_id`
    pub fn answer(thread_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            thread_id: Some(thread_id.into()),
        }
    }

    /// The message with surrounding whitespace removed, or `None` when blank
    pub fn message_text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    /// The thread id, or `None` when blank
    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Whether the thread is waiting for the learner or finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    AwaitingInput,
    Complete,
}

impl ChatStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ChatStatus::AwaitingInput => "awaiting_input",
            ChatStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body returned by `POST /chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Question prompt while awaiting input, evaluation text when complete
    pub response: String,
    pub thread_id: String,
    pub status: ChatStatus,
}

/// Error body returned by every endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

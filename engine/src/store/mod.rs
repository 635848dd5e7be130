//! Conversation thread storage
//!
//! The quiz workflow never touches storage directly; it goes through the
//! `ThreadStore` trait so the in-process map can be swapped for the SQLite
//! backend (or a test double) without changing the workflow.

use async_trait::async_trait;
use sdk::{ChatStatus, TutorError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::llm::{Message, MessageRole};
use crate::quiz::RunState;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryThreadStore;
pub use sqlite::SqliteThreadStore;

/// A thread: its append-only message log and the persisted run state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationThread {
    pub id: String,
    pub messages: Vec<Message>,
    pub state: RunState,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ConversationThread {
    pub fn new(id: impl Into<String>, messages: Vec<Message>, state: RunState) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: id.into(),
            messages,
            state,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> ChatStatus {
        self.state.status()
    }

    /// Content of the most recent assistant message
    pub fn last_assistant_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
            .map(|m| m.content.as_str())
    }
}

/// One row of a thread listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: String,
    pub status: ChatStatus,
    pub message_count: usize,
    pub updated_at: i64,
}

/// Keyed store mapping thread id to its ordered message list and run state
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Insert a new thread
    ///
    /// # Errors
    /// `TutorError::ThreadExists` if the id is already taken
    async fn create(&self, thread: ConversationThread) -> Result<(), TutorError>;

    /// Fetch a thread, `None` if it was never created
    async fn load(&self, id: &str) -> Result<Option<ConversationThread>, TutorError>;

    /// Append `messages` in order and replace the run state, atomically
    ///
    /// # Errors
    /// `TutorError::ThreadNotFound` if the thread does not exist
    async fn append(
        &self,
        id: &str,
        messages: &[Message],
        state: RunState,
    ) -> Result<(), TutorError>;

    /// Most recently updated threads first
    async fn list(&self, limit: usize) -> Result<Vec<ThreadSummary>, TutorError>;
}

/// Open the backend named by `config.backend`
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn ThreadStore>, TutorError> {
    match config.backend.as_str() {
        "memory" => {
            tracing::info!("Using in-memory thread store");
            Ok(Arc::new(MemoryThreadStore::new()))
        }
        "sqlite" => Ok(Arc::new(SqliteThreadStore::new(&config.path).await?)),
        other => Err(TutorError::Config(format!(
            "Unknown store backend '{}'",
            other
        ))),
    }
}

//! In-process thread store
//!
//! Threads live for the life of the process and are lost on restart.

use async_trait::async_trait;
use sdk::TutorError;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{ConversationThread, ThreadStore, ThreadSummary};
use crate::llm::Message;
use crate::quiz::RunState;

#[derive(Default)]
pub struct MemoryThreadStore {
    threads: RwLock<HashMap<String, ConversationThread>>,
}

impl MemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.threads.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.threads.read().await.is_empty()
    }
}

#[async_trait]
impl ThreadStore for MemoryThreadStore {
    async fn create(&self, thread: ConversationThread) -> Result<(), TutorError> {
        let mut threads = self.threads.write().await;
        if threads.contains_key(&thread.id) {
            return Err(TutorError::ThreadExists(thread.id));
        }
        threads.insert(thread.id.clone(), thread);
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<ConversationThread>, TutorError> {
        Ok(self.threads.read().await.get(id).cloned())
    }

    async fn append(
        &self,
        id: &str,
        messages: &[Message],
        state: RunState,
    ) -> Result<(), TutorError> {
        let mut threads = self.threads.write().await;
        let thread = threads
            .get_mut(id)
            .ok_or_else(|| TutorError::ThreadNotFound(id.to_string()))?;

        thread.messages.extend_from_slice(messages);
        thread.state = state;
        thread.updated_at = chrono::Utc::now().timestamp();
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<ThreadSummary>, TutorError> {
        let threads = self.threads.read().await;
        let mut summaries: Vec<ThreadSummary> = threads
            .values()
            .map(|t| ThreadSummary {
                id: t.id.clone(),
                status: t.status(),
                message_count: t.messages.len(),
                updated_at: t.updated_at,
            })
            .collect();

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        summaries.truncate(limit);
        Ok(summaries)
    }
}

//! Shared test doubles for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tutor_engine::llm::{LLMError, LLMProvider, Message, Result};
use tutor_engine::quiz::{Prompts, QuizWorkflow};
use tutor_engine::store::{MemoryThreadStore, ThreadStore};

pub const QUESTION: &str = "Jak se jmenuješ? (What is your name?)";
pub const EVALUATION: &str = "Great answer! \"Jmenuji se Petr\" is correct.";

/// Provider that replays a script of replies and records every call
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<(String, Vec<Message>)>>,
    delay: Duration,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    /// Question then evaluation
    pub fn happy_path() -> Self {
        Self::new(vec![Ok(QUESTION.to_string()), Ok(EVALUATION.to_string())])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn push_reply(&self, reply: Result<String>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<(String, Vec<Message>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn generate(&self, system_instruction: &str, history: &[Message]) -> Result<Message> {
        self.calls
            .lock()
            .unwrap()
            .push((system_instruction.to_string(), history.to_vec()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LLMError::ProviderUnavailable("script exhausted".into())));

        reply.map(Message::assistant)
    }
}

/// Workflow over `provider` and a fresh in-memory store
pub fn workflow_with(provider: Arc<ScriptedProvider>) -> (Arc<QuizWorkflow>, Arc<MemoryThreadStore>) {
    let store = Arc::new(MemoryThreadStore::new());
    let workflow = QuizWorkflow::new(
        provider,
        Arc::clone(&store) as Arc<dyn ThreadStore>,
        Prompts::for_language("Czech"),
    );
    (Arc::new(workflow), store)
}

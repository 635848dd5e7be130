//! Quiz workflow: question, human input, evaluation
//!
//! `QuizWorkflow` owns the model provider and the thread store. Every public
//! operation loads what it needs from the store, runs at most one model call,
//! and persists the result only after that call succeeded. A failed question
//! creates no thread; a failed evaluation leaves the thread awaiting input
//! with its history untouched so the same answer can be sent again.

use sdk::{ChatRequest, ChatResponse, ChatStatus, TutorError};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::locks::ThreadLocks;
use super::{Prompts, RunPhase, RunState};
use crate::config::Config;
use crate::llm::{build_provider, LLMProvider, Message};
use crate::store::{open_store, ConversationThread, ThreadStore, ThreadSummary};

pub struct QuizWorkflow {
    provider: Arc<dyn LLMProvider>,
    store: Arc<dyn ThreadStore>,
    prompts: Prompts,
    locks: ThreadLocks,
}

impl QuizWorkflow {
    pub fn new(provider: Arc<dyn LLMProvider>, store: Arc<dyn ThreadStore>, prompts: Prompts) -> Self {
        Self {
            provider,
            store,
            prompts,
            locks: ThreadLocks::new(),
        }
    }

    /// Wire the configured provider, store and prompts together
    pub async fn from_config(config: &Config) -> Result<Self, TutorError> {
        let provider = build_provider(&config.llm)?;
        let store = open_store(&config.store).await?;
        Ok(Self::new(provider, store, Prompts::from_config(&config.quiz)))
    }

    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    pub fn store(&self) -> &Arc<dyn ThreadStore> {
        &self.store
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    /// Dispatch a chat request
    ///
    /// | thread id | message | result                                  |
    /// |-----------|---------|-----------------------------------------|
    /// | absent    | ignored | new thread, question asked              |
    /// | present   | present | pending question answered and evaluated |
    /// | present   | absent  | current prompt or stored evaluation     |
    ///
    /// Blank values count as absent.
    pub async fn handle(&self, request: &ChatRequest) -> Result<ChatResponse, TutorError> {
        match (request.thread_id(), request.message_text()) {
            (None, _) => self.start().await,
            (Some(thread_id), Some(answer)) => self.resume(thread_id, answer).await,
            (Some(thread_id), None) => self.status(thread_id).await,
        }
    }

    /// Start a new thread and ask its question
    ///
    /// The model sees only the configured opening request, which is not
    /// recorded in the thread.
    pub async fn start(&self) -> Result<ChatResponse, TutorError> {
        let thread_id = Uuid::new_v4().to_string();
        info!("Starting quiz thread {}", thread_id);

        let question = self.ask_question(&thread_id).await?;

        let prompt = question.content.clone();
        let thread = ConversationThread::new(
            &thread_id,
            vec![question],
            RunState::awaiting_text(&prompt),
        );
        self.store.create(thread).await?;

        info!("Thread {} awaiting answer", thread_id);
        Ok(ChatResponse {
            response: prompt,
            thread_id,
            status: ChatStatus::AwaitingInput,
        })
    }

    /// Answer the pending question of `thread_id` and evaluate it
    ///
    /// # Errors
    /// - `ThreadNotFound` if the thread does not exist
    /// - `ThreadComplete` if the thread was already evaluated
    /// - `InvalidInput` if the answer is rejected
    /// - `LLMProvider` if the evaluation call fails
    pub async fn resume(&self, thread_id: &str, answer: &str) -> Result<ChatResponse, TutorError> {
        let _guard = self.locks.acquire(thread_id).await;
        let thread = self.load(thread_id).await?;

        let answer = collect_answer(&thread, answer)?;
        let phase = thread.state.phase().transition(RunPhase::Evaluating)?;
        info!("Thread {} received answer, evaluating", thread_id);

        let mut history = thread.messages;
        history.push(answer.clone());

        let evaluation = self.evaluate_answer(thread_id, &history).await?;
        phase.transition(RunPhase::Complete)?;

        let response = evaluation.content.clone();
        self.store
            .append(thread_id, &[answer, evaluation], RunState::Complete)
            .await?;

        info!("Thread {} complete", thread_id);
        Ok(ChatResponse {
            response,
            thread_id: thread_id.to_string(),
            status: ChatStatus::Complete,
        })
    }

    /// Report where `thread_id` stands without calling the model
    ///
    /// An awaiting thread returns its pending prompt; a complete one returns
    /// the stored evaluation.
    pub async fn status(&self, thread_id: &str) -> Result<ChatResponse, TutorError> {
        let _guard = self.locks.acquire(thread_id).await;
        let thread = self.load(thread_id).await?;

        let response = match &thread.state {
            RunState::AwaitingInput { prompt, .. } => prompt.clone(),
            RunState::Complete => thread
                .last_assistant_content()
                .map(str::to_string)
                .ok_or_else(|| {
                    TutorError::Store(format!("Thread {} is complete but has no evaluation", thread_id))
                })?,
        };

        debug!("Thread {} queried, status {}", thread_id, thread.status());
        Ok(ChatResponse {
            response,
            thread_id: thread.id.clone(),
            status: thread.status(),
        })
    }

    /// Full stored thread
    pub async fn thread(&self, thread_id: &str) -> Result<ConversationThread, TutorError> {
        self.load(thread_id).await
    }

    /// Most recently updated threads first
    pub async fn list(&self, limit: usize) -> Result<Vec<ThreadSummary>, TutorError> {
        self.store.list(limit).await
    }

    async fn load(&self, thread_id: &str) -> Result<ConversationThread, TutorError> {
        self.store
            .load(thread_id)
            .await?
            .ok_or_else(|| TutorError::ThreadNotFound(thread_id.to_string()))
    }

    /// Question step: one assistant message asking a question
    async fn ask_question(&self, thread_id: &str) -> Result<Message, TutorError> {
        let input = vec![Message::human(&self.prompts.opening_request)];

        debug!("Thread {} asking {} for a question", thread_id, self.provider.name());
        self.provider
            .generate(&self.prompts.system, &input)
            .await
            .map_err(|e| {
                warn!("Question step failed for thread {}: {}", thread_id, e);
                TutorError::from(e)
            })
    }

    /// Evaluation step: feedback on the last answer in `history`
    async fn evaluate_answer(
        &self,
        thread_id: &str,
        history: &[Message],
    ) -> Result<Message, TutorError> {
        let mut input = Vec::with_capacity(history.len() + 1);
        input.push(Message::human(&self.prompts.evaluation));
        input.extend_from_slice(history);

        debug!("Thread {} asking {} for an evaluation", thread_id, self.provider.name());
        self.provider
            .generate(&self.prompts.system, &input)
            .await
            .map_err(|e| {
                warn!("Evaluation step failed for thread {}: {}", thread_id, e);
                TutorError::from(e)
            })
    }
}

/// Human-input step: validate the resume payload against what the run expects
fn collect_answer(thread: &ConversationThread, raw: &str) -> Result<Message, TutorError> {
    match &thread.state {
        RunState::AwaitingInput { expects, .. } => Ok(Message::human(expects.validate(raw)?)),
        RunState::Complete => Err(TutorError::ThreadComplete(thread.id.clone())),
    }
}

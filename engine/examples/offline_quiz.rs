//! Example driving a full quiz run without a network connection
//!
//! A canned provider stands in for the model so the three-step flow
//! (question, answer, evaluation) can be seen end to end.

use async_trait::async_trait;
use sdk::ChatRequest;
use std::sync::Arc;
use tutor_engine::llm::{LLMProvider, Message, MessageRole, Result};
use tutor_engine::quiz::{Prompts, QuizWorkflow};
use tutor_engine::store::MemoryThreadStore;

/// Asks a fixed question, then praises whatever the learner said
struct CannedProvider;

#[async_trait]
impl LLMProvider for CannedProvider {
    fn name(&self) -> &str {
        "canned"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn generate(&self, _system_instruction: &str, history: &[Message]) -> Result<Message> {
        let answer = history
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Human && history.len() > 1)
            .map(|m| m.content.clone());

        Ok(match answer {
            Some(answer) => Message::assistant(format!(
                "\"{}\" is a good answer. No corrections needed.",
                answer
            )),
            None => Message::assistant("Jaké je tvoje oblíbené jídlo? (What is your favourite food?)"),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let workflow = QuizWorkflow::new(
        Arc::new(CannedProvider),
        Arc::new(MemoryThreadStore::new()),
        Prompts::for_language("Czech"),
    );

    let question = workflow.handle(&ChatRequest::start()).await?;
    println!("[{}] {}", question.status, question.response);

    let evaluation = workflow
        .handle(&ChatRequest::answer(&question.thread_id, "Moje oblíbené jídlo je guláš"))
        .await?;
    println!("[{}] {}", evaluation.status, evaluation.response);

    let thread = workflow.thread(&question.thread_id).await?;
    println!();
    println!("Thread {} has {} messages:", thread.id, thread.messages.len());
    for message in &thread.messages {
        println!("  {:>9}: {}", message.role.as_str(), message.content);
    }

    Ok(())
}

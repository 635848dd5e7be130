//! Quiz workflow
//!
//! A run asks one question in the target language, suspends until the
//! learner answers, then evaluates the answer. Each call into the workflow
//! executes at most one of those segments and returns.

pub mod locks;
pub mod prompts;
pub mod state;
pub mod workflow;

pub use prompts::Prompts;
pub use state::{InputKind, RunPhase, RunState, MAX_ANSWER_CHARS};
pub use workflow::QuizWorkflow;

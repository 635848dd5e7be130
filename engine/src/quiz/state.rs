//! Run state machine
//!
//! A quiz run moves through `Start -> Asking -> AwaitingAnswer -> Evaluating
//! -> Complete`. Only two of those phases are ever persisted: the suspended
//! `AwaitingInput` state (with the prompt shown to the learner and the kind of
//! payload expected on resume) and `Complete`.

use sdk::{ChatStatus, TutorError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest answer accepted on resume, in characters
pub const MAX_ANSWER_CHARS: usize = 2000;

/// Payload a suspended run expects when it is resumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Free text typed by the learner
    Text,
}

impl InputKind {
    /// Check a raw resume value and return the text to record
    pub fn validate(&self, raw: &str) -> Result<String, TutorError> {
        match self {
            InputKind::Text => {
                let text = raw.trim();
                if text.is_empty() {
                    return Err(TutorError::InvalidInput("answer must not be empty".into()));
                }
                let len = text.chars().count();
                if len > MAX_ANSWER_CHARS {
                    return Err(TutorError::InvalidInput(format!(
                        "answer is {} characters, the limit is {}",
                        len, MAX_ANSWER_CHARS
                    )));
                }
                Ok(text.to_string())
            }
        }
    }
}

/// Persisted state of a thread's run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    /// Suspended after the question step
    AwaitingInput { prompt: String, expects: InputKind },

    /// Evaluation recorded; the run is finished
    Complete,
}

impl RunState {
    /// Suspended state for a freshly asked question
    pub fn awaiting_text(prompt: impl Into<String>) -> Self {
        RunState::AwaitingInput {
            prompt: prompt.into(),
            expects: InputKind::Text,
        }
    }

    pub fn phase(&self) -> RunPhase {
        match self {
            RunState::AwaitingInput { .. } => RunPhase::AwaitingAnswer,
            RunState::Complete => RunPhase::Complete,
        }
    }

    pub fn status(&self) -> ChatStatus {
        match self {
            RunState::AwaitingInput { .. } => ChatStatus::AwaitingInput,
            RunState::Complete => ChatStatus::Complete,
        }
    }
}

/// Every phase a run passes through, persisted or not
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    Start,
    Asking,
    AwaitingAnswer,
    Evaluating,
    Complete,
}

impl RunPhase {
    /// The single phase reachable from this one
    pub fn next(self) -> Option<RunPhase> {
        match self {
            RunPhase::Start => Some(RunPhase::Asking),
            RunPhase::Asking => Some(RunPhase::AwaitingAnswer),
            RunPhase::AwaitingAnswer => Some(RunPhase::Evaluating),
            RunPhase::Evaluating => Some(RunPhase::Complete),
            RunPhase::Complete => None,
        }
    }

    /// Move to `to`, which must be the direct successor of `self`
    pub fn transition(self, to: RunPhase) -> Result<RunPhase, TutorError> {
        if self.next() == Some(to) {
            Ok(to)
        } else {
            Err(TutorError::InvalidTransition {
                from: self.to_string(),
                to: to.to_string(),
            })
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Start => "start",
            RunPhase::Asking => "asking",
            RunPhase::AwaitingAnswer => "awaiting_answer",
            RunPhase::Evaluating => "evaluating",
            RunPhase::Complete => "complete",
        };
        f.write_str(s)
    }
}

//! Fixed instructions sent to the model

use crate::config::QuizConfig;

/// The three instructions a quiz run uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    /// System instruction for both model calls
    pub system: String,

    /// Human request sent when a thread has no history yet
    pub opening_request: String,

    /// Instruction placed ahead of the history for the evaluation call
    pub evaluation: String,
}

impl Prompts {
    /// Built-in prompts for `language`
    pub fn for_language(language: &str) -> Self {
        Self {
            system: format!(
                "You are a patient {language} tutor working with a beginner. \
                 When asked for a question, reply with exactly one short, simple question \
                 written in {language}, followed by its English translation in parentheses. \
                 Keep the vocabulary basic and everyday. Do not answer the question yourself."
            ),
            opening_request: format!("Ask me a {language} question"),
            evaluation: format!(
                "Evaluate the student's answer to the previous question. \
                 Provide feedback and a corrected version (only if necessary), \
                 but do it in English as the student is still a beginner in {language}."
            ),
        }
    }

    /// Built-in prompts with any overrides from the `[quiz]` section applied
    pub fn from_config(config: &QuizConfig) -> Self {
        let mut prompts = Self::for_language(&config.language);
        if let Some(system) = &config.system_prompt {
            prompts.system = system.clone();
        }
        if let Some(opening) = &config.opening_request {
            prompts.opening_request = opening.clone();
        }
        if let Some(evaluation) = &config.evaluation_prompt {
            prompts.evaluation = evaluation.clone();
        }
        prompts
    }
}

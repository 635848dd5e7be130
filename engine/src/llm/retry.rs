//! Retry wrapper for LLM providers
//!
//! `RetryingProvider` re-issues a request when the wrapped provider fails with
//! a transient error (rate limit, network, timeout, unavailable). Permanent
//! failures such as a bad API key are returned immediately.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::{LLMError, LLMProvider, Message, Result};

/// Upper bound on a single backoff sleep
const MAX_DELAY: Duration = Duration::from_secs(10);

/// How many times to retry and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry; doubled for each further one
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Whether a failure on attempt number `attempt` (0-based) should be retried
    pub fn should_retry(&self, attempt: u32, error: &LLMError) -> bool {
        attempt < self.max_retries && error.is_transient()
    }

    /// Backoff before retry number `attempt + 1`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(MAX_DELAY)
    }
}

/// Provider decorator applying a `RetryPolicy`
pub struct RetryingProvider {
    inner: Arc<dyn LLMProvider>,
    policy: RetryPolicy,
}

impl RetryingProvider {
    pub fn new(inner: Arc<dyn LLMProvider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl LLMProvider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_local(&self) -> bool {
        self.inner.is_local()
    }

    async fn check_health(&self) -> bool {
        self.inner.check_health().await
    }

    async fn generate(&self, system_instruction: &str, history: &[Message]) -> Result<Message> {
        let mut attempt = 0;
        loop {
            match self.inner.generate(system_instruction, history).await {
                Ok(message) => return Ok(message),
                Err(e) if self.policy.should_retry(attempt, &e) => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}): {}. Retrying in {}ms",
                        self.inner.name(),
                        attempt + 1,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

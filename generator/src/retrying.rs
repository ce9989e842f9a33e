//! Bounded retry around a generation backend

use std::time::Duration;
use tracing::debug;

use shared::{GenerationResult, session_error, session_info, session_warn};
use crate::error::BackendError;
use crate::traits::{ArtifactStore, GenerationClient, RetryObserver};
use crate::types::GenerationRequest;

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    /// The error is not retryable
    GiveUp,
    /// Transient error, but no attempts are left
    Exhausted,
}

/// Decide the next step after `attempt` (1-based) failed with `error` (pure function)
pub fn next_step(error: &BackendError, attempt: u32, max_attempts: u32, delay: Duration) -> RetryDecision {
    if !error.is_transient() {
        RetryDecision::GiveUp
    } else if attempt >= max_attempts {
        RetryDecision::Exhausted
    } else {
        RetryDecision::RetryAfter(delay)
    }
}

/// Generator that retries transient backend failures with a fixed delay.
///
/// `max_attempts` counts every call to the backend, the first one included.
/// Callers are responsible for keeping one generation in flight per session.
pub struct RetryingGenerator<C, S>
where
    C: GenerationClient,
    S: ArtifactStore,
{
    client: C,
    store: S,
    max_attempts: u32,
    retry_delay: Duration,
}

impl<C, S> RetryingGenerator<C, S>
where
    C: GenerationClient,
    S: ArtifactStore,
{
    pub fn new(client: C, store: S, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            client,
            store,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run the request until it succeeds, fails fatally or runs out of attempts.
    ///
    /// Never returns an `Err`: every failure is folded into the result status.
    pub async fn generate(&self, request: &GenerationRequest, observer: &dyn RetryObserver) -> GenerationResult {
        let mut attempt = 1;
        loop {
            debug!("🎨 Generation attempt {}/{} for {}", attempt, self.max_attempts, request.session);

            let error = match self.client.generate(request).await {
                Ok(bytes) => return self.persist(request, &bytes).await,
                Err(error) => error,
            };

            match next_step(&error, attempt, self.max_attempts, self.retry_delay) {
                RetryDecision::RetryAfter(delay) => {
                    session_warn!(
                        request.session,
                        "⏳ Backend unavailable (attempt {}/{}), retrying in {}s: {}",
                        attempt,
                        self.max_attempts,
                        delay.as_secs(),
                        error.message
                    );
                    attempt += 1;
                    observer.on_retry(attempt, self.max_attempts, delay).await;
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    session_error!(request.session, "❌ Generation failed: {}", error.message);
                    return GenerationResult::error(&request.prompt, error.message);
                }
                RetryDecision::Exhausted => {
                    session_error!(request.session, "❌ Generation failed after {} attempts", self.max_attempts);
                    return GenerationResult::error(&request.prompt, "max retries exceeded");
                }
            }
        }
    }

    async fn persist(&self, request: &GenerationRequest, bytes: &[u8]) -> GenerationResult {
        match self.store.save(&request.session, bytes).await {
            Ok(path) => {
                session_info!(request.session, "✅ Stored artifact at {}", path.display());
                GenerationResult::ok(&request.prompt, path)
            }
            Err(e) => {
                session_error!(request.session, "❌ Failed to store artifact: {}", e);
                GenerationResult::error(&request.prompt, format!("failed to store artifact: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors_are_not_retried() {
        let error = BackendError::fatal("invalid token");
        assert_eq!(next_step(&error, 1, 3, Duration::from_secs(10)), RetryDecision::GiveUp);
    }

    #[test]
    fn test_transient_errors_retry_until_last_attempt() {
        let error = BackendError::transient("too busy");
        let delay = Duration::from_secs(10);
        assert_eq!(next_step(&error, 1, 3, delay), RetryDecision::RetryAfter(delay));
        assert_eq!(next_step(&error, 2, 3, delay), RetryDecision::RetryAfter(delay));
        assert_eq!(next_step(&error, 3, 3, delay), RetryDecision::Exhausted);
    }

    #[test]
    fn test_single_attempt_never_retries() {
        let error = BackendError::transient("overloaded");
        assert_eq!(next_step(&error, 1, 1, Duration::ZERO), RetryDecision::Exhausted);
    }
}

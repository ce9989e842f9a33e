//! Prompt merge strategy trait definition

use async_trait::async_trait;
use shared::FeedbackSignals;

/// Folds a round of feedback into the next prompt
#[mockall::automock]
#[async_trait]
pub trait PromptMerger: Send + Sync {
    /// Produce the next prompt.
    ///
    /// Total: strategies that depend on a remote service fall back to a local
    /// merge instead of failing. With no non-zero signals the result is a
    /// fresh seed prompt.
    async fn merge(&self, previous_prompt: &str, signals: &FeedbackSignals) -> String;

    /// Strategy name for logs
    fn name(&self) -> &'static str;
}

//! Trait definitions with mockall annotations for testing
//!
//! Everything the engine talks to outside its own process sits behind one of
//! these traits so tests can swap in mocks.

use std::collections::HashMap;
use std::time::Duration;

use shared::{ArtifactPost, FeedbackSignals, MessageId};
use crate::error::EvolutionResult;

/// Chat-side rendering of session output
///
/// Inbound reactions do not go through this trait: the presenter pushes
/// `Trigger`s into the engine's trigger channel.
#[mockall::automock]
#[async_trait::async_trait]
pub trait SessionPresenter: Send + Sync {
    /// Post an image with its caption and reaction affordances
    ///
    /// # Returns
    /// The platform id of the posted message, used later for retraction
    async fn post_artifact(&self, post: ArtifactPost) -> EvolutionResult<MessageId>;

    /// Delete a previously posted artifact message
    async fn retract_artifact(&self, message_id: &str) -> EvolutionResult<()>;

    /// Replace the short status line shown under the session
    async fn update_status(&self, text: &str) -> EvolutionResult<()>;

    /// Archive and lock the session's thread
    async fn archive_session(&self) -> EvolutionResult<()>;

    async fn notify_retry(&self, attempt: u32, max_attempts: u32, delay: Duration) -> EvolutionResult<()>;

    async fn report_error(&self, message: &str) -> EvolutionResult<()>;
}

/// Image plus metadata handed to a marketplace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub image: Vec<u8>,
    pub name: String,
    pub description: String,
    pub receiver_identity: String,
}

/// Marketplace answer to a publish request
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReceipt {
    pub success: bool,
    pub token_id: String,
    pub receipt: serde_json::Value,
}

/// Storage/marketplace network that mints finalized artifacts
#[mockall::automock]
#[async_trait::async_trait]
pub trait PublisherClient: Send + Sync {
    async fn publish(&self, request: PublishRequest) -> EvolutionResult<PublishReceipt>;
}

/// Language model that rewrites a prompt under weighted feedback
#[mockall::automock]
#[async_trait::async_trait]
pub trait PromptRewriter: Send + Sync {
    async fn rewrite(&self, prompt: &str, signals: &FeedbackSignals) -> EvolutionResult<String>;
}

/// Source of API credentials for the configured backends
#[mockall::automock]
#[async_trait::async_trait]
pub trait CredentialSource: Send + Sync {
    /// Retrieve the requested keys
    ///
    /// # Returns
    /// Every required key with its value, plus whichever optional keys are set,
    /// or `MissingCredential` naming the first required key that is absent
    async fn load(&self, required: &[String], optional: &[String]) -> EvolutionResult<HashMap<String, String>>;
}

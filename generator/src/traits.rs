//! Generator trait definitions for dependency injection

use std::path::{Path, PathBuf};
use std::time::Duration;
use async_trait::async_trait;

use shared::SessionId;
use crate::error::{BackendError, GeneratorResult};
use crate::types::GenerationRequest;

/// Text-to-image backend
#[mockall::automock]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Produce encoded image bytes for a prompt
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u8>, BackendError>;
}

/// Receives a notification before each retry sleep
#[mockall::automock]
#[async_trait]
pub trait RetryObserver: Send + Sync {
    /// `next_attempt` is the 1-based attempt about to run after `delay`
    async fn on_retry(&self, next_attempt: u32, max_attempts: u32, delay: Duration);
}

/// Local persistence for generated images
#[mockall::automock]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write image bytes for a session and return where they landed
    async fn save(&self, session: &SessionId, bytes: &[u8]) -> GeneratorResult<PathBuf>;

    async fn load(&self, path: &Path) -> GeneratorResult<Vec<u8>>;

    /// Remove a stored image; a missing file is not an error
    async fn remove(&self, path: &Path) -> GeneratorResult<()>;
}

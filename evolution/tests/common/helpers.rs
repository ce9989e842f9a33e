//! Test helpers and builder patterns for engine tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use evolution::merging::{AppendMerger, PromptMerger, SeedPrompts};
use evolution::traits::MockPublisherClient;
use evolution::{EvolutionEngine, EvolutionError, EvolutionResult, SessionPresenter};
use generator::{BackendError, FileArtifactStore, GenerationClient, GenerationRequest, RetryingGenerator};
use shared::{ArtifactPost, EvolutionConfig, FeedbackSignals, MessageId, PostKind};
use tempfile::TempDir;

use super::fixtures::TestFixtures;

pub type TestEngine = EvolutionEngine<ScriptedClient, FileArtifactStore, RecordingPresenter, MockPublisherClient>;

/// Everything the engine asked the presenter to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum PresenterCall {
    Post { message_id: MessageId, kind: PostKind, caption: String },
    Retract(MessageId),
    Status(String),
    Archive,
    Retry { attempt: u32, max_attempts: u32, delay: Duration },
    Error(String),
}

#[derive(Clone, Default)]
pub struct RecordingPresenter {
    calls: Arc<Mutex<Vec<PresenterCall>>>,
    next_message: Arc<AtomicUsize>,
    fail_posts: Arc<AtomicBool>,
}

impl RecordingPresenter {
    /// While set, `post_artifact` fails and records nothing
    pub fn set_failing_posts(&self, failing: bool) {
        self.fail_posts.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<PresenterCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn posts(&self) -> Vec<(MessageId, PostKind, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PresenterCall::Post { message_id, kind, caption } => Some((message_id, kind, caption)),
                _ => None,
            })
            .collect()
    }

    pub fn position(&self, wanted: &PresenterCall) -> Option<usize> {
        self.calls().iter().position(|call| call == wanted)
    }

    fn record(&self, call: PresenterCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SessionPresenter for RecordingPresenter {
    async fn post_artifact(&self, post: ArtifactPost) -> EvolutionResult<MessageId> {
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(EvolutionError::presentation("chat unavailable"));
        }
        let message_id = format!("m{}", self.next_message.fetch_add(1, Ordering::SeqCst));
        self.record(PresenterCall::Post {
            message_id: message_id.clone(),
            kind: post.kind,
            caption: post.caption,
        });
        Ok(message_id)
    }

    async fn retract_artifact(&self, message_id: &str) -> EvolutionResult<()> {
        self.record(PresenterCall::Retract(message_id.to_string()));
        Ok(())
    }

    async fn update_status(&self, text: &str) -> EvolutionResult<()> {
        self.record(PresenterCall::Status(text.to_string()));
        Ok(())
    }

    async fn archive_session(&self) -> EvolutionResult<()> {
        self.record(PresenterCall::Archive);
        Ok(())
    }

    async fn notify_retry(&self, attempt: u32, max_attempts: u32, delay: Duration) -> EvolutionResult<()> {
        self.record(PresenterCall::Retry {
            attempt,
            max_attempts,
            delay,
        });
        Ok(())
    }

    async fn report_error(&self, message: &str) -> EvolutionResult<()> {
        self.record(PresenterCall::Error(message.to_string()));
        Ok(())
    }
}

/// Backend stub: plays back scripted failures, then returns a PNG
#[derive(Clone, Default)]
pub struct ScriptedClient {
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
    failures: Arc<Mutex<VecDeque<BackendError>>>,
    panic_next: Arc<AtomicBool>,
}

impl ScriptedClient {
    pub fn failing_with(failures: impl IntoIterator<Item = BackendError>) -> Self {
        let client = Self::default();
        client.failures.lock().unwrap().extend(failures);
        client
    }

    /// The next call panics instead of answering
    pub fn panicking() -> Self {
        let client = Self::default();
        client.panic_next.store(true, Ordering::SeqCst);
        client
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u8>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());
        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("backend exploded");
        }
        match self.failures.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(TestFixtures::png_bytes()),
        }
    }
}

/// Merger that panics on every call
pub struct PanickingMerger;

#[async_trait]
impl PromptMerger for PanickingMerger {
    async fn merge(&self, _previous_prompt: &str, _signals: &FeedbackSignals) -> String {
        panic!("merger exploded")
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

/// Builder for engines wired to recording test doubles
pub struct EngineBuilder {
    config: EvolutionConfig,
    client: ScriptedClient,
    merger: Option<Arc<dyn PromptMerger>>,
    publisher: Option<MockPublisherClient>,
}

/// A built engine with handles on its collaborators
pub struct TestHarness {
    pub engine: TestEngine,
    pub presenter: RecordingPresenter,
    pub client: ScriptedClient,
    pub artifacts: TempDir,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: TestFixtures::config(),
            client: ScriptedClient::default(),
            merger: None,
            publisher: None,
        }
    }

    pub fn with_config(mut self, config: EvolutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_client(mut self, client: ScriptedClient) -> Self {
        self.client = client;
        self
    }

    pub fn with_merger(mut self, merger: Arc<dyn PromptMerger>) -> Self {
        self.merger = Some(merger);
        self
    }

    pub fn with_publisher(mut self, publisher: MockPublisherClient) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn build(self) -> TestHarness {
        let artifacts = tempfile::tempdir().unwrap();
        let merger = self.merger.unwrap_or_else(|| {
            let seeds = SeedPrompts::new(self.config.starter_prompts.clone()).unwrap();
            Arc::new(AppendMerger::new(seeds))
        });
        let generator = RetryingGenerator::new(
            self.client.clone(),
            FileArtifactStore::new(artifacts.path()),
            self.config.max_retries,
            self.config.retry_delay(),
        );
        let presenter = RecordingPresenter::default();

        let engine = EvolutionEngine::new(self.config, generator, merger, presenter.clone(), self.publisher).unwrap();

        TestHarness {
            engine,
            presenter,
            client: self.client,
            artifacts,
        }
    }
}

//! Async driver for one evolution session
//!
//! The engine owns the [`EvolutionMachine`] and is its only caller: round
//! ticks, presenter triggers and completions of spawned work are consumed by
//! one `tokio::select!` loop, so transitions never race.

use std::collections::VecDeque;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};

use generator::{ArtifactStore, GenerationClient, GenerationRequest, RetryObserver, RetryingGenerator};
use shared::{
    ArtifactPost, EvolutionConfig, FeedbackSignals, GenerationResult, PostKind, PublishRecord, SessionId, SessionState,
    Trigger, logging, session_debug, session_error, session_info, session_warn,
};

use crate::core::{Effect, EvolutionMachine, PublishOrder, Session};
use crate::error::{EvolutionError, EvolutionResult};
use crate::merging::PromptMerger;
use crate::traits::{PublishRequest, PublisherClient, SessionPresenter};

const CHANNEL_CAPACITY: usize = 64;

/// Result of work spawned off the select loop
#[derive(Debug)]
enum Completion {
    Generated { session: SessionId, result: GenerationResult },
    Merged { session: SessionId, prompt: String },
    MergeFailed { session: SessionId, reason: String },
    Published { session: SessionId, outcome: Result<PublishRecord, String> },
}

/// Forwards retry notices from the generator to the presenter
struct PresenterRetryObserver<P>
where
    P: SessionPresenter,
{
    presenter: Arc<P>,
    session: SessionId,
}

#[async_trait]
impl<P> RetryObserver for PresenterRetryObserver<P>
where
    P: SessionPresenter,
{
    async fn on_retry(&self, next_attempt: u32, max_attempts: u32, delay: Duration) {
        if let Err(e) = self.presenter.notify_retry(next_attempt, max_attempts, delay).await {
            session_warn!(self.session, "⚠️ Could not announce retry: {}", e);
        }
    }
}

/// Evolution engine with injected generator, merger, presenter and publisher
pub struct EvolutionEngine<C, S, P, B>
where
    C: GenerationClient + 'static,
    S: ArtifactStore + 'static,
    P: SessionPresenter + 'static,
    B: PublisherClient + 'static,
{
    config: Arc<EvolutionConfig>,
    machine: EvolutionMachine,

    /// Injected services
    generator: Arc<RetryingGenerator<C, S>>,
    merger: Arc<dyn PromptMerger>,
    presenter: Arc<P>,
    publisher: Option<Arc<B>>,

    trigger_tx: mpsc::Sender<Trigger>,
    trigger_rx: mpsc::Receiver<Trigger>,
    completion_tx: mpsc::Sender<Completion>,
    completion_rx: mpsc::Receiver<Completion>,
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: mpsc::Receiver<()>,

    /// Spawned generations, merges and publishes not yet reported back
    in_flight: usize,
}

impl<C, S, P, B> EvolutionEngine<C, S, P, B>
where
    C: GenerationClient + 'static,
    S: ArtifactStore + 'static,
    P: SessionPresenter + 'static,
    B: PublisherClient + 'static,
{
    /// Create a new engine; `publisher` may be `None` when publishing is disabled
    pub fn new(
        config: EvolutionConfig,
        generator: RetryingGenerator<C, S>,
        merger: Arc<dyn PromptMerger>,
        presenter: P,
        publisher: Option<B>,
    ) -> EvolutionResult<Self> {
        config.validate()?;
        if config.publish.enabled && publisher.is_none() {
            return Err(EvolutionError::config("publish.enabled requires a publisher"));
        }

        let config = Arc::new(config);
        let machine = EvolutionMachine::new(Arc::clone(&config))?;
        let (trigger_tx, trigger_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (completion_tx, completion_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        Ok(Self {
            config,
            machine,
            generator: Arc::new(generator),
            merger,
            presenter: Arc::new(presenter),
            publisher: publisher.map(Arc::new),
            trigger_tx,
            trigger_rx,
            completion_tx,
            completion_rx,
            shutdown_tx,
            shutdown_rx,
            in_flight: 0,
        })
    }

    /// Sender the presenter uses to feed reactions and commands in
    pub fn trigger_sender(&self) -> mpsc::Sender<Trigger> {
        self.trigger_tx.clone()
    }

    /// Get shutdown sender for external shutdown requests
    pub fn shutdown_sender(&self) -> mpsc::Sender<()> {
        self.shutdown_tx.clone()
    }

    pub fn machine(&self) -> &EvolutionMachine {
        &self.machine
    }

    pub fn session(&self) -> &Session {
        self.machine.session()
    }

    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Main event loop: round timer, inbound triggers, completions and shutdown
    pub async fn run(&mut self) -> EvolutionResult<()> {
        let mut round_timer = interval(self.config.round_interval());
        round_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        logging::log_startup(&format!(
            "evolution engine ({}s rounds, {} merge)",
            self.config.seconds_per_round,
            self.merger.name()
        ));

        loop {
            tokio::select! {
                _ = round_timer.tick() => {
                    self.dispatch(Trigger::Tick).await;
                },

                Some(trigger) = self.trigger_rx.recv() => {
                    self.dispatch(trigger).await;
                },

                Some(completion) = self.completion_rx.recv() => {
                    self.handle_completion(completion).await;
                },

                Some(_) = self.shutdown_rx.recv() => {
                    session_info!(
                        self.session().id,
                        "🛑 Stopping engine in state {} ({} task(s) abandoned)",
                        self.state(),
                        self.in_flight
                    );
                    break;
                }
            }
        }

        Ok(())
    }

    /// Apply one trigger and carry out the resulting effects
    pub async fn dispatch(&mut self, trigger: Trigger) {
        let effects = self.machine.handle(&trigger);
        self.apply(effects).await;
    }

    /// Wait until every spawned task has reported back and its effects are applied
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.completion_rx.recv().await {
                Some(completion) => self.handle_completion(completion).await,
                None => break,
            }
        }
    }

    async fn handle_completion(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let effects = match completion {
            Completion::Generated { session, result } => self.machine.generation_finished(session, result),
            Completion::Merged { session, prompt } => self.machine.merge_finished(session, prompt),
            Completion::MergeFailed { session, reason } => self.machine.merge_failed(session, &reason),
            Completion::Published { session, outcome } => self.machine.publish_finished(session, outcome),
        };
        self.apply(effects).await;
    }

    async fn apply(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            queue.extend(self.perform(effect).await);
        }
    }

    async fn perform(&mut self, effect: Effect) -> Vec<Effect> {
        let session = self.session().id;
        match effect {
            Effect::Generate(request) => {
                self.spawn_generation(request);
                Vec::new()
            }
            Effect::Merge { prompt, signals } => {
                self.spawn_merge(session, prompt, signals);
                Vec::new()
            }
            Effect::PostArtifact { path, caption, kind } => self.post_artifact(path, caption, kind).await,
            Effect::RetractArtifact(message_id) => {
                if let Err(e) = self.presenter.retract_artifact(&message_id).await {
                    session_warn!(session, "⚠️ Could not retract {}: {}", message_id, e);
                }
                Vec::new()
            }
            Effect::DiscardArtifact(path) => {
                if let Err(e) = self.generator.store().remove(&path).await {
                    session_warn!(session, "⚠️ Could not remove {}: {}", path.display(), e);
                }
                Vec::new()
            }
            Effect::UpdateStatus(text) => {
                if let Err(e) = self.presenter.update_status(&text).await {
                    session_warn!(session, "⚠️ Status update failed: {}", e);
                }
                Vec::new()
            }
            Effect::ReportError(message) => {
                session_error!(session, "{}", message);
                if let Err(e) = self.presenter.report_error(&message).await {
                    session_warn!(session, "⚠️ Error report failed: {}", e);
                }
                Vec::new()
            }
            Effect::ArchiveSession => {
                if let Err(e) = self.presenter.archive_session().await {
                    session_warn!(session, "⚠️ Archiving failed: {}", e);
                }
                Vec::new()
            }
            Effect::Publish(order) => {
                self.spawn_publish(order);
                Vec::new()
            }
        }
    }

    async fn post_artifact(&mut self, path: PathBuf, caption: String, kind: PostKind) -> Vec<Effect> {
        let session = self.session().id;
        let image = match self.generator.store().load(&path).await {
            Ok(image) => image,
            Err(e) => {
                session_error!(session, "❌ Could not load {}: {}", path.display(), e);
                return self.machine.artifact_posted(None);
            }
        };

        let affordances = match kind {
            PostKind::Final => Vec::new(),
            PostKind::Initial | PostKind::Variation => self.config.affordances(),
        };
        let post = ArtifactPost {
            image,
            caption,
            kind,
            affordances,
        };

        match self.presenter.post_artifact(post).await {
            Ok(message_id) => {
                session_debug!(session, "📤 Posted {:?} artifact as {}", kind, message_id);
                self.machine.artifact_posted(Some(message_id))
            }
            Err(e) => {
                session_error!(session, "❌ {}", e);
                self.machine.artifact_posted(None)
            }
        }
    }

    /// Run `work` off the loop; a panic is turned into a completion by `on_panic`
    /// so the in-flight count always drains.
    fn spawn_reporting<F, R>(&mut self, work: F, on_panic: R)
    where
        F: Future<Output = Completion> + Send + 'static,
        R: FnOnce(String) -> Completion + Send + 'static,
    {
        let completion_tx = self.completion_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let completion = match tokio::spawn(work).await {
                Ok(completion) => completion,
                Err(e) => on_panic(e.to_string()),
            };
            let _ = completion_tx.send(completion).await;
        });
    }

    fn spawn_generation(&mut self, request: GenerationRequest) {
        let generator = Arc::clone(&self.generator);
        let observer = PresenterRetryObserver {
            presenter: Arc::clone(&self.presenter),
            session: request.session,
        };
        let session = request.session;
        let prompt = request.prompt.clone();

        self.spawn_reporting(
            async move {
                let result = generator.generate(&request, &observer).await;
                Completion::Generated {
                    session: request.session,
                    result,
                }
            },
            move |reason| Completion::Generated {
                session,
                result: GenerationResult::error(prompt, format!("generator crashed: {reason}")),
            },
        );
    }

    fn spawn_merge(&mut self, session: SessionId, prompt: String, signals: FeedbackSignals) {
        let merger = Arc::clone(&self.merger);

        self.spawn_reporting(
            async move {
                let prompt = merger.merge(&prompt, &signals).await;
                Completion::Merged { session, prompt }
            },
            move |reason| Completion::MergeFailed { session, reason },
        );
    }

    fn spawn_publish(&mut self, order: PublishOrder) {
        let session = order.session;
        let crashed = move |reason: String| Completion::Published {
            session,
            outcome: Err(format!("publisher crashed: {reason}")),
        };

        let Some(publisher) = self.publisher.clone() else {
            self.spawn_reporting(
                async move {
                    Completion::Published {
                        session,
                        outcome: Err("no publisher configured".to_string()),
                    }
                },
                crashed,
            );
            return;
        };
        let generator = Arc::clone(&self.generator);

        self.spawn_reporting(
            async move {
                let outcome = publish_artifact(generator.store(), publisher.as_ref(), &order)
                    .await
                    .map_err(|e| match e {
                        EvolutionError::PublishError { message } => message,
                        other => other.to_string(),
                    });
                Completion::Published { session, outcome }
            },
            crashed,
        );
    }
}

/// Load the archived image, mint it and write the publish record next to it
pub async fn publish_artifact<S, B>(store: &S, publisher: &B, order: &PublishOrder) -> EvolutionResult<PublishRecord>
where
    S: ArtifactStore + ?Sized,
    B: PublisherClient + ?Sized,
{
    let image = store.load(&order.artifact_path).await?;
    let receipt = publisher
        .publish(PublishRequest {
            image,
            name: order.name.clone(),
            description: order.description.clone(),
            receiver_identity: order.receiver_identity.clone(),
        })
        .await?;

    if !receipt.success {
        return Err(EvolutionError::publish(format!(
            "marketplace rejected token {}",
            receipt.token_id
        )));
    }

    let record = PublishRecord {
        artifact_path: order.artifact_path.clone(),
        name: order.name.clone(),
        description: order.description.clone(),
        receiver_identity: order.receiver_identity.clone(),
        token_id: receipt.token_id,
        transaction_receipt: receipt.receipt,
    };

    let record_path = order.artifact_path.with_extension("publish.json");
    match serde_json::to_vec_pretty(&record) {
        Ok(bytes) => {
            if let Err(e) = tokio::fs::write(&record_path, bytes).await {
                session_warn!(order.session, "⚠️ Minted but could not write {}: {}", record_path.display(), e);
            }
        }
        Err(e) => session_warn!(order.session, "⚠️ Could not serialize publish record: {}", e),
    }

    session_info!(order.session, "🎉 Published {} as token {}", order.name, record.token_id);
    Ok(record)
}

//! The evolution state machine
//!
//! Transitions are synchronous: every entry point mutates the session and
//! returns the [`Effect`]s the driver has to carry out. Results of those
//! effects come back through `generation_finished`, `merge_finished`,
//! `artifact_posted` and `publish_finished`.

use std::path::PathBuf;
use std::sync::Arc;

use generator::GenerationRequest;
use shared::{
    ArtifactHandle, EvolutionConfig, FeedbackSignals, GenerationResult, GenerationStatus, MessageId, MetaSignal,
    PostKind, PublishRecord, SessionId, SessionState, Trigger, session_debug, session_info, session_warn,
};

use super::aggregator::{Classification, FeedbackAggregator};
use super::session::Session;
use crate::error::EvolutionResult;
use crate::merging::SeedPrompts;

pub const WAITING_STATUS: &str = "⏳ waiting for feedback...";

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start a generation; the result arrives via `generation_finished`
    Generate(GenerationRequest),
    /// Start a prompt merge; the result arrives via `merge_finished`
    Merge { prompt: String, signals: FeedbackSignals },
    /// Post an image; confirm with `artifact_posted`
    PostArtifact { path: PathBuf, caption: String, kind: PostKind },
    RetractArtifact(MessageId),
    /// Delete a superseded image from local storage
    DiscardArtifact(PathBuf),
    UpdateStatus(String),
    ReportError(String),
    ArchiveSession,
    /// Mint an archived artifact; the result arrives via `publish_finished`
    Publish(PublishOrder),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOrder {
    pub session: SessionId,
    pub artifact_path: PathBuf,
    pub name: String,
    pub description: String,
    pub receiver_identity: String,
}

/// Result of the most recently finalized session
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivedArtifact {
    pub session: SessionId,
    pub prompt: String,
    pub path: PathBuf,
    pub rounds: u32,
    pub record: Option<PublishRecord>,
    pub publishing: bool,
}

pub struct EvolutionMachine {
    config: Arc<EvolutionConfig>,
    aggregator: FeedbackAggregator,
    seeds: SeedPrompts,
    session: Session,
    previous_session: Option<Session>,
    last_seed: Option<String>,
    /// Released once the next post is confirmed
    pending_retractions: Vec<MessageId>,
    pending_discards: Vec<PathBuf>,
    last_archived: Option<ArchivedArtifact>,
    completed_sessions: u32,
    /// Set by `Trigger::Stop`; ticks are ignored until the next start
    paused: bool,
}

impl EvolutionMachine {
    pub fn new(config: Arc<EvolutionConfig>) -> EvolutionResult<Self> {
        config.validate()?;
        let seeds = SeedPrompts::new(config.starter_prompts.clone())?;
        let session = Self::fresh_session(&config);

        Ok(Self {
            aggregator: FeedbackAggregator::from_config(&config),
            config,
            seeds,
            session,
            previous_session: None,
            last_seed: None,
            pending_retractions: Vec::new(),
            pending_discards: Vec::new(),
            last_archived: None,
            completed_sessions: 0,
            paused: false,
        })
    }

    fn fresh_session(config: &EvolutionConfig) -> Session {
        Session::new(config.max_rounds, config.lowest_quality())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }

    /// The session replaced by the most recent restart or new-session tick
    pub fn previous_session(&self) -> Option<&Session> {
        self.previous_session.as_ref()
    }

    pub fn last_archived(&self) -> Option<&ArchivedArtifact> {
        self.last_archived.as_ref()
    }

    pub fn completed_sessions(&self) -> u32 {
        self.completed_sessions
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Apply an inbound trigger
    pub fn handle(&mut self, trigger: &Trigger) -> Vec<Effect> {
        let cause = trigger.label();
        match trigger {
            Trigger::Publish => self.request_publish(),
            Trigger::Stop => self.stop(),
            Trigger::Start { prompt } => self.start(prompt.as_deref(), &cause),
            _ if self.session.state.is_busy() => {
                session_debug!(self.session.id, "⏸️ Dropped {} while {}", cause, self.session.state);
                Vec::new()
            }
            Trigger::Tick if self.paused => {
                session_debug!(self.session.id, "⏸️ Paused, ignoring tick");
                Vec::new()
            }
            Trigger::Tick => self.on_tick(&cause),
            Trigger::Feedback { name, delta } => self.on_feedback(name, *delta, &cause),
            Trigger::Meta { name } => match self.config.meta_signal_for(name) {
                Some(signal) => self.on_meta(signal, &cause),
                None => {
                    session_debug!(self.session.id, "Ignoring unknown meta signal {}", name);
                    Vec::new()
                }
            },
        }
    }

    fn on_tick(&mut self, cause: &str) -> Vec<Effect> {
        match self.session.state {
            SessionState::Idle => self.begin_generation(cause),
            SessionState::AwaitingFeedback => self.evaluate(cause),
            SessionState::Archived => self.start_new_session(None, cause),
            SessionState::Generating | SessionState::Merging | SessionState::Finalizing => Vec::new(),
        }
    }

    /// Resume after a stop; an explicit prompt seeds the next session
    fn start(&mut self, prompt: Option<&str>, cause: &str) -> Vec<Effect> {
        let resumed = std::mem::take(&mut self.paused);
        if resumed {
            session_info!(self.session.id, "▶️ Resumed");
        }

        match (self.session.state, prompt) {
            (SessionState::Idle, Some(prompt)) => {
                self.session.current_prompt = Some(prompt.to_string());
                self.begin_generation(cause)
            }
            (SessionState::Idle, None) => self.begin_generation(cause),
            (SessionState::Archived, prompt) => self.start_new_session(prompt.map(str::to_string), cause),
            // A new seed replaces the running evolution
            (SessionState::AwaitingFeedback, Some(prompt)) => self.restart(Some(prompt.to_string()), cause),
            _ if resumed => vec![Effect::UpdateStatus("▶️ Evolution resumed".to_string())],
            _ => {
                session_debug!(self.session.id, "Ignoring {} while {}", cause, self.session.state);
                Vec::new()
            }
        }
    }

    fn stop(&mut self) -> Vec<Effect> {
        if self.paused {
            return Vec::new();
        }
        self.paused = true;
        session_info!(self.session.id, "⏸️ Paused in state {}", self.session.state);
        vec![Effect::UpdateStatus(
            "⏸️ Evolution paused. Send `start` to resume.".to_string(),
        )]
    }

    fn on_feedback(&mut self, name: &str, delta: i64, cause: &str) -> Vec<Effect> {
        match self.config.meta_signal_for(name) {
            None | Some(MetaSignal::Approve) => {}
            // Reserved tags arriving as reactions act as meta signals
            Some(signal) if delta > 0 => return self.on_meta(signal, cause),
            Some(_) => return Vec::new(),
        }

        if self.session.state != SessionState::AwaitingFeedback {
            session_debug!(self.session.id, "Ignoring {} while {}", cause, self.session.state);
            return Vec::new();
        }

        self.session.record_feedback(name, delta);
        if self.config.evaluate_on_feedback && !self.paused {
            self.evaluate(cause)
        } else {
            Vec::new()
        }
    }

    fn on_meta(&mut self, signal: MetaSignal, cause: &str) -> Vec<Effect> {
        match signal {
            MetaSignal::Approve => {
                let approve = self.config.approve_signal_name.clone();
                self.on_feedback(&approve, 1, cause)
            }
            MetaSignal::Finish if self.session.state == SessionState::AwaitingFeedback => self.finalize(cause),
            MetaSignal::Finish => Vec::new(),
            // Both would start a generation
            MetaSignal::UpgradeQuality | MetaSignal::Restart if self.paused => Vec::new(),
            MetaSignal::UpgradeQuality => self.upgrade_quality(cause),
            MetaSignal::Restart => self.restart(None, cause),
        }
    }

    fn begin_generation(&mut self, cause: &str) -> Vec<Effect> {
        let prompt = match &self.session.current_prompt {
            Some(prompt) => prompt.clone(),
            None => {
                let seed = self.seeds.pick_excluding(self.last_seed.as_deref());
                session_info!(self.session.id, "🌱 Seeded with \"{}\"", seed);
                self.last_seed = Some(seed.clone());
                self.session.current_prompt = Some(seed.clone());
                seed
            }
        };
        self.generate(prompt, cause)
    }

    fn generate(&mut self, prompt: String, cause: &str) -> Vec<Effect> {
        self.session.transition(SessionState::Generating, cause);
        let status = format!("🎨 Generating at {} quality...", self.session.quality_level);
        let request = GenerationRequest::new(self.session.id, prompt, self.session.quality_level.clone());
        vec![Effect::UpdateStatus(status), Effect::Generate(request)]
    }

    /// Round evaluation; the round limit wins over any classification
    fn evaluate(&mut self, cause: &str) -> Vec<Effect> {
        if self.session.rounds_exhausted() {
            return self.finalize(&format!("max rounds reached ({cause})"));
        }

        match self.aggregator.classify(&self.session.feedback_signals) {
            Classification::NoFeedback => vec![Effect::UpdateStatus(WAITING_STATUS.to_string())],
            Classification::EarlyFinish => self.finalize(&format!("approved ({cause})")),
            Classification::Directed(signals) => {
                let prompt = self.session.current_prompt.clone().unwrap_or_default();
                self.session.round_index += 1;
                self.session.transition(SessionState::Merging, cause);
                let summary = signals
                    .iter()
                    .map(|(name, weight)| format!("{name}×{weight}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                vec![
                    Effect::UpdateStatus(format!("🧬 Evolving with {summary}")),
                    Effect::Merge { prompt, signals },
                ]
            }
        }
    }

    fn upgrade_quality(&mut self, cause: &str) -> Vec<Effect> {
        if self.session.state != SessionState::AwaitingFeedback {
            return Vec::new();
        }

        match self.config.next_quality(&self.session.quality_level) {
            Some(next) => {
                session_info!(self.session.id, "⬆️ Quality {} -> {}", self.session.quality_level, next);
                self.session.quality_level = next;
                let prompt = self.session.current_prompt.clone().unwrap_or_default();
                self.generate(prompt, cause)
            }
            None => vec![Effect::UpdateStatus(format!(
                "⬆️ Already at the highest quality ({})",
                self.session.quality_level
            ))],
        }
    }

    fn restart(&mut self, seed: Option<String>, cause: &str) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.session.state != SessionState::Archived && self.session.current_artifact.is_some() {
            self.session.reset_feedback();
            self.session.transition(SessionState::Archived, cause);
            effects.push(Effect::ArchiveSession);
        }
        effects.extend(self.start_new_session(seed, cause));
        effects
    }

    fn start_new_session(&mut self, seed: Option<String>, cause: &str) -> Vec<Effect> {
        let mut fresh = Self::fresh_session(&self.config);
        fresh.current_prompt = seed;
        let previous = std::mem::replace(&mut self.session, fresh);
        session_info!(self.session.id, "🆕 New session (previous {} ended {})", previous.id, previous.state);
        self.previous_session = Some(previous);
        self.begin_generation(cause)
    }

    fn finalize(&mut self, cause: &str) -> Vec<Effect> {
        self.session.transition(SessionState::Finalizing, cause);

        let Some(artifact) = self.session.current_artifact.clone() else {
            session_warn!(self.session.id, "Finalizing without an artifact");
            self.session.transition(SessionState::Archived, "nothing to finalize");
            return vec![Effect::ArchiveSession];
        };

        if let Some(message_id) = artifact.message_id.clone() {
            self.pending_retractions.push(message_id);
        }

        let mut effects = vec![
            Effect::PostArtifact {
                path: artifact.path.clone(),
                caption: self.caption(PostKind::Final),
                kind: PostKind::Final,
            },
            Effect::ArchiveSession,
        ];
        self.session.transition(SessionState::Archived, "finalized");
        self.completed_sessions += 1;
        session_info!(self.session.id, "🏁 Finalized after {} rounds", self.session.round_index);

        let mut archived = ArchivedArtifact {
            session: self.session.id,
            prompt: self.session.current_prompt.clone().unwrap_or_default(),
            path: artifact.path,
            rounds: self.session.round_index,
            record: None,
            publishing: false,
        };
        if self.config.publish.enabled {
            archived.publishing = true;
            effects.push(Effect::Publish(Self::publish_order(&self.config, &archived)));
        }
        self.last_archived = Some(archived);
        effects
    }

    fn request_publish(&mut self) -> Vec<Effect> {
        if !self.config.publish.enabled {
            return vec![Effect::UpdateStatus("Publishing is disabled".to_string())];
        }

        match self.last_archived.as_mut() {
            None => vec![Effect::UpdateStatus("Nothing to publish yet".to_string())],
            Some(archived) => {
                if let Some(record) = &archived.record {
                    vec![Effect::UpdateStatus(format!("Already published as token {}", record.token_id))]
                } else if archived.publishing {
                    vec![Effect::UpdateStatus("Publishing already in progress".to_string())]
                } else {
                    archived.publishing = true;
                    vec![Effect::Publish(Self::publish_order(&self.config, archived))]
                }
            }
        }
    }

    fn publish_order(config: &EvolutionConfig, archived: &ArchivedArtifact) -> PublishOrder {
        PublishOrder {
            session: archived.session,
            artifact_path: archived.path.clone(),
            name: format!("{} {}", config.publish.name_prefix, archived.session.short()),
            description: format!(
                "{}\nPrompt: {}\nRounds: {}",
                config.publish.description, archived.prompt, archived.rounds
            ),
            receiver_identity: config.publish.receiver_identity.clone(),
        }
    }

    fn caption(&self, kind: PostKind) -> String {
        let prompt = self.session.current_prompt.as_deref().unwrap_or_default();
        match kind {
            PostKind::Initial => format!("🌱 New evolution\nPrompt: {prompt}"),
            PostKind::Variation => {
                let progress = match self.session.max_rounds {
                    Some(max) => format!("{}/{}", self.session.round_index, max),
                    None => self.session.round_index.to_string(),
                };
                format!(
                    "🧬 Variation {progress} ({} quality)\nPrompt: {prompt}",
                    self.session.quality_level
                )
            }
            PostKind::Final => format!("✨ Final Result\nPrompt: {prompt}"),
        }
    }

    /// A generation started by `Effect::Generate` completed
    pub fn generation_finished(&mut self, session: SessionId, result: GenerationResult) -> Vec<Effect> {
        if session != self.session.id || self.session.state != SessionState::Generating {
            session_warn!(session, "Ignoring stale generation result");
            return Vec::new();
        }

        match result.status {
            GenerationStatus::Ok => {
                let kind = if self.session.current_artifact.is_some() {
                    PostKind::Variation
                } else {
                    PostKind::Initial
                };
                let current = ArtifactHandle::unposted(&result.artifact_path);
                if let Some(previous) = self.session.current_artifact.replace(current) {
                    self.supersede(previous);
                }
                self.session.reset_feedback();
                self.session.transition(SessionState::AwaitingFeedback, "generation ok");
                vec![Effect::PostArtifact {
                    path: result.artifact_path,
                    caption: self.caption(kind),
                    kind,
                }]
            }
            GenerationStatus::Error(reason) => {
                self.session.transition(SessionState::Idle, "generation failed");
                vec![Effect::ReportError(format!("❌ Failed to generate image: {reason}"))]
            }
        }
    }

    fn supersede(&mut self, previous: ArtifactHandle) {
        if let Some(message_id) = previous.message_id {
            self.pending_retractions.push(message_id);
        }
        if !self.config.retain_superseded_artifacts {
            self.pending_discards.push(previous.path);
        }
    }

    /// A merge started by `Effect::Merge` completed
    pub fn merge_finished(&mut self, session: SessionId, prompt: String) -> Vec<Effect> {
        if session != self.session.id || self.session.state != SessionState::Merging {
            session_warn!(session, "Ignoring stale merge result");
            return Vec::new();
        }
        session_info!(self.session.id, "📝 Round {} prompt: \"{}\"", self.session.round_index, prompt);
        self.session.current_prompt = Some(prompt.clone());
        self.generate(prompt, "merged")
    }

    /// A merge crashed before producing a prompt.
    ///
    /// The round is rolled back and its feedback dropped, so the session
    /// keeps waiting on the current artifact.
    pub fn merge_failed(&mut self, session: SessionId, reason: &str) -> Vec<Effect> {
        if session != self.session.id || self.session.state != SessionState::Merging {
            session_warn!(session, "Ignoring stale merge failure");
            return Vec::new();
        }
        self.session.round_index = self.session.round_index.saturating_sub(1);
        self.session.reset_feedback();
        self.session.transition(SessionState::AwaitingFeedback, "merge failed");
        vec![Effect::ReportError(format!("❌ Failed to merge feedback: {reason}"))]
    }

    /// The presenter answered a `PostArtifact`; `None` when posting failed.
    ///
    /// Superseded artifacts are only released after a confirmed post.
    pub fn artifact_posted(&mut self, message_id: Option<MessageId>) -> Vec<Effect> {
        let Some(message_id) = message_id else {
            return Vec::new();
        };

        if let Some(current) = self.session.current_artifact.as_mut() {
            current.message_id = Some(message_id);
        }

        let mut effects: Vec<Effect> = self
            .pending_retractions
            .drain(..)
            .map(Effect::RetractArtifact)
            .collect();
        effects.extend(self.pending_discards.drain(..).map(Effect::DiscardArtifact));
        effects
    }

    /// A publish started by `Effect::Publish` completed
    pub fn publish_finished(&mut self, session: SessionId, outcome: Result<PublishRecord, String>) -> Vec<Effect> {
        let Some(archived) = self.last_archived.as_mut().filter(|a| a.session == session) else {
            session_warn!(session, "Ignoring publish result for an unknown archive");
            return Vec::new();
        };
        archived.publishing = false;

        match outcome {
            Ok(record) => {
                let status = format!("🎉 Published as token {}", record.token_id);
                archived.record = Some(record);
                vec![Effect::UpdateStatus(status)]
            }
            Err(message) => vec![Effect::ReportError(format!(
                "❌ Publish failed: {message}. Send `publish` to retry."
            ))],
        }
    }
}

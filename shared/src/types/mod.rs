//! Core types used throughout the evolution system

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::errors::{SharedError, SharedResult};

/// Feedback weights keyed by signal name.
///
/// Ordered by name so that anything built from it (merged prompts, logs)
/// is deterministic.
pub type FeedbackSignals = BTreeMap<String, u64>;

/// Opaque identifier for one evolution session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> SharedResult<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| SharedError::InvalidUuid { input: s.to_string() })
    }

    /// First eight hex digits, enough to tell sessions apart in logs
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session_{}", self.short())
    }
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Generating,
    AwaitingFeedback,
    Merging,
    Finalizing,
    Archived,
}

impl SessionState {
    /// True while a generation or merge is in flight for the session
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Generating | SessionState::Merging)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Generating => "generating",
            SessionState::AwaitingFeedback => "awaiting_feedback",
            SessionState::Merging => "merging",
            SessionState::Finalizing => "finalizing",
            SessionState::Archived => "archived",
        };
        f.write_str(name)
    }
}

/// Position in the configured, ordered list of quality levels
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualityLevel {
    pub index: usize,
    pub name: String,
}

impl QualityLevel {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self { index, name: name.into() }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Reserved signals that drive the state machine instead of the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetaSignal {
    Finish,
    UpgradeQuality,
    Restart,
    Approve,
}

impl fmt::Display for MetaSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetaSignal::Finish => "finish",
            MetaSignal::UpgradeQuality => "upgrade-quality",
            MetaSignal::Restart => "restart",
            MetaSignal::Approve => "approve",
        };
        f.write_str(name)
    }
}

/// Outcome of a generation attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationStatus {
    Ok,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub prompt: String,
    pub artifact_path: PathBuf,
    pub status: GenerationStatus,
}

impl GenerationResult {
    pub fn ok(prompt: impl Into<String>, artifact_path: impl Into<PathBuf>) -> Self {
        Self {
            prompt: prompt.into(),
            artifact_path: artifact_path.into(),
            status: GenerationStatus::Ok,
        }
    }

    pub fn error(prompt: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            artifact_path: PathBuf::new(),
            status: GenerationStatus::Error(reason.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, GenerationStatus::Ok)
    }
}

/// Platform message id returned by the presenter for a posted artifact
pub type MessageId = String;

/// The image a session currently owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHandle {
    pub path: PathBuf,
    pub message_id: Option<MessageId>,
}

impl ArtifactHandle {
    pub fn unposted(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), message_id: None }
    }
}

/// Minted artifact, written once per published session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRecord {
    pub artifact_path: PathBuf,
    pub name: String,
    pub description: String,
    pub receiver_identity: String,
    pub token_id: String,
    pub transaction_receipt: serde_json::Value,
}

/// One recorded state change of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: SessionState,
    pub to: SessionState,
    pub cause: String,
}

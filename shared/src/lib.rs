//! Shared types for the image evolution bot
//!
//! Contains the session data model, the configuration surface and the
//! messages exchanged between the engine, the generator and the presenter.

pub mod config;
pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use config::{BackendSettings, EvolutionConfig, MergeStrategyKind, MetaSignalNames, PublishSettings, RewriterSettings};
pub use errors::*;
pub use messages::{ArtifactPost, PostKind, Trigger};
pub use types::*;

//! Core business logic modules
//!
//! Pure session logic with no I/O: classification, session data and the
//! transition table. Everything here is synchronous and deterministic apart
//! from seed selection.

pub mod aggregator;
pub mod machine;
pub mod session;

pub use aggregator::{Classification, FeedbackAggregator};
pub use machine::{ArchivedArtifact, Effect, EvolutionMachine, PublishOrder, WAITING_STATUS};
pub use session::Session;

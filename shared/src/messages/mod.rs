//! Message types exchanged with the evolution engine
//!
//! - `trigger`: inbound events (ticks, feedback, meta signals) for one session
//! - `presenter`: outbound render requests consumed by the chat presenter

pub mod presenter;
pub mod trigger;

pub use presenter::{ArtifactPost, PostKind};
pub use trigger::Trigger;

//! Community-driven image evolution engine
//!
//! A session generates an image from a seed prompt, collects chat reactions
//! for a round, folds them into the next prompt and generates again until
//! the community approves the result, asks to finish, or the round limit is
//! reached. Finished artifacts can optionally be minted on a marketplace.

pub mod core;
pub mod engine;
pub mod error;
pub mod merging;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use core::{Classification, EvolutionMachine, FeedbackAggregator, Session};
pub use engine::{EvolutionEngine, publish_artifact};
pub use error::{EvolutionError, EvolutionResult};
pub use merging::{PromptMerger, create_merger};
pub use traits::{CredentialSource, PromptRewriter, PublishReceipt, PublishRequest, PublisherClient, SessionPresenter};

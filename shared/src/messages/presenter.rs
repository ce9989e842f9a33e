//! Render requests sent to the chat presenter

use serde::{Deserialize, Serialize};

/// Where an artifact post sits in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostKind {
    /// First image of a new session
    Initial,
    /// Regenerated image after merged feedback or a quality upgrade
    Variation,
    /// Result of a finalized session
    Final,
}

/// An image to post together with its caption and feedback affordances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPost {
    pub image: Vec<u8>,
    pub caption: String,
    pub kind: PostKind,
    /// Reaction tags the presenter pre-attaches so users can vote
    pub affordances: Vec<String>,
}

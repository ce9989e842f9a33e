//! Deterministic append merge

use async_trait::async_trait;
use shared::FeedbackSignals;

use crate::merging::seeds::SeedPrompts;
use crate::merging::traits::PromptMerger;

/// Weights above this collapse into a single `<tag>×<weight>` token
pub const MAX_TAG_REPEATS: u64 = 10;

/// `"<prompt>, but more <tag> and <tag> ..."`, each tag repeated by its weight.
///
/// Returns `None` when no signal has a non-zero weight. Tags appear in name
/// order since `FeedbackSignals` is ordered.
pub fn append_feedback(prompt: &str, signals: &FeedbackSignals) -> Option<String> {
    let repeated: Vec<String> = signals
        .iter()
        .filter(|(_, weight)| **weight > 0)
        .flat_map(|(name, &weight)| {
            if weight > MAX_TAG_REPEATS {
                vec![format!("{name}×{weight}")]
            } else {
                vec![name.clone(); weight as usize]
            }
        })
        .collect();

    if repeated.is_empty() {
        None
    } else {
        Some(format!("{}, but more {}", prompt, repeated.join(" and ")))
    }
}

pub struct AppendMerger {
    seeds: SeedPrompts,
}

impl AppendMerger {
    pub fn new(seeds: SeedPrompts) -> Self {
        Self { seeds }
    }
}

#[async_trait]
impl PromptMerger for AppendMerger {
    async fn merge(&self, previous_prompt: &str, signals: &FeedbackSignals) -> String {
        append_feedback(previous_prompt, signals).unwrap_or_else(|| self.seeds.pick_excluding(Some(previous_prompt)))
    }

    fn name(&self) -> &'static str {
        "append"
    }
}

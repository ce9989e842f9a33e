//! Feedback classification
//!
//! Reduces the tallies attached to the current artifact into the decision the
//! state machine acts on. Integer arithmetic only.

use std::collections::HashSet;

use shared::{EvolutionConfig, FeedbackSignals};

/// Outcome of classifying one round of feedback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Every tally, approve included, is zero
    NoFeedback,
    /// Non-meta tallies to merge into the next prompt, zero entries removed
    Directed(FeedbackSignals),
    /// Approve weight strictly exceeds the sum of everything else
    EarlyFinish,
}

/// Classifies feedback tallies against the configured reserved names
#[derive(Debug, Clone)]
pub struct FeedbackAggregator {
    approve_signal: String,
    reserved: HashSet<String>,
}

impl FeedbackAggregator {
    pub fn new(approve_signal: impl Into<String>, reserved: impl IntoIterator<Item = String>) -> Self {
        let approve_signal = approve_signal.into();
        let mut reserved: HashSet<String> = reserved.into_iter().collect();
        reserved.insert(approve_signal.clone());
        Self { approve_signal, reserved }
    }

    pub fn from_config(config: &EvolutionConfig) -> Self {
        let names = &config.meta_signal_names;
        Self::new(
            config.approve_signal_name.clone(),
            [names.finish.clone(), names.upgrade_quality.clone(), names.restart.clone()],
        )
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    pub fn classify(&self, signals: &FeedbackSignals) -> Classification {
        let approve = signals.get(&self.approve_signal).copied().unwrap_or(0);

        let directed: FeedbackSignals = signals
            .iter()
            .filter(|(name, weight)| **weight > 0 && !self.is_reserved(name))
            .map(|(name, weight)| (name.clone(), *weight))
            .collect();
        let others = directed.values().fold(0u64, |sum, weight| sum.saturating_add(*weight));

        if approve == 0 && others == 0 {
            Classification::NoFeedback
        } else if approve > others {
            Classification::EarlyFinish
        } else {
            Classification::Directed(directed)
        }
    }
}

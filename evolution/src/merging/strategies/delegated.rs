//! Merge delegated to a language model, with local fallback

use async_trait::async_trait;
use tracing::{debug, warn};
use shared::FeedbackSignals;

use crate::merging::seeds::SeedPrompts;
use crate::merging::strategies::append::append_feedback;
use crate::merging::traits::PromptMerger;
use crate::traits::PromptRewriter;

const END_OF_SENTENCE: &str = "<｜end▁of▁sentence｜>";

/// Drop reasoning output and wrapping noise from a model answer
pub fn clean_rewrite(raw: &str) -> String {
    let answer = raw.rsplit("</think>").next().unwrap_or(raw).trim();
    let answer = answer.strip_suffix(END_OF_SENTENCE).unwrap_or(answer).trim();
    answer
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(answer)
        .trim()
        .to_string()
}

pub struct DelegatedMerger<R>
where
    R: PromptRewriter,
{
    rewriter: R,
    seeds: SeedPrompts,
}

impl<R> DelegatedMerger<R>
where
    R: PromptRewriter,
{
    pub fn new(rewriter: R, seeds: SeedPrompts) -> Self {
        Self { rewriter, seeds }
    }
}

#[async_trait]
impl<R> PromptMerger for DelegatedMerger<R>
where
    R: PromptRewriter,
{
    async fn merge(&self, previous_prompt: &str, signals: &FeedbackSignals) -> String {
        let active: FeedbackSignals = signals
            .iter()
            .filter(|(_, weight)| **weight > 0)
            .map(|(name, weight)| (name.clone(), *weight))
            .collect();

        let Some(fallback) = append_feedback(previous_prompt, &active) else {
            return self.seeds.pick_excluding(Some(previous_prompt));
        };

        match self.rewriter.rewrite(previous_prompt, &active).await {
            Ok(raw) => {
                let rewritten = clean_rewrite(&raw);
                if rewritten.is_empty() {
                    warn!("⚠️ Rewriter returned an empty prompt, falling back to append");
                    fallback
                } else {
                    debug!("🧠 Rewrote prompt: {}", rewritten);
                    rewritten
                }
            }
            Err(e) => {
                warn!("⚠️ Prompt rewrite failed, falling back to append: {}", e);
                fallback
            }
        }
    }

    fn name(&self) -> &'static str {
        "delegated"
    }
}

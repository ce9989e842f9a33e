//! Prompt merging: strategy trait, starter prompts and implementations
//!
//! The strategy is picked once at startup from `prompt_merge_strategy`.

pub mod seeds;
pub mod strategies;
pub mod traits;

use std::collections::HashMap;
use std::sync::Arc;

use shared::{EvolutionConfig, MergeStrategyKind};
use crate::error::{EvolutionError, EvolutionResult};
use crate::services::credentials::DEEPSEEK_API_KEY;
use crate::services::rewriter::ChatRewriter;

pub use seeds::SeedPrompts;
pub use strategies::{AppendMerger, DelegatedMerger};
pub use traits::PromptMerger;

/// Build the configured merge strategy
pub fn create_merger(config: &EvolutionConfig, credentials: &HashMap<String, String>) -> EvolutionResult<Arc<dyn PromptMerger>> {
    let seeds = SeedPrompts::new(config.starter_prompts.clone())?;

    match config.prompt_merge_strategy {
        MergeStrategyKind::Append => Ok(Arc::new(AppendMerger::new(seeds))),
        MergeStrategyKind::Delegated => {
            let api_key = credentials
                .get(DEEPSEEK_API_KEY)
                .ok_or_else(|| EvolutionError::MissingCredential {
                    key: DEEPSEEK_API_KEY.to_string(),
                })?;
            let rewriter = ChatRewriter::new(&config.rewriter, api_key.clone())?;
            Ok(Arc::new(DelegatedMerger::new(rewriter, seeds)))
        }
    }
}

//! Starter prompt selection

use rand::seq::SliceRandom;

use crate::error::{EvolutionError, EvolutionResult};

/// Non-empty set of starter prompts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPrompts {
    prompts: Vec<String>,
}

impl SeedPrompts {
    pub fn new(prompts: impl IntoIterator<Item = String>) -> EvolutionResult<Self> {
        let prompts: Vec<String> = prompts
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if prompts.is_empty() {
            return Err(EvolutionError::config("starter_prompts"));
        }
        Ok(Self { prompts })
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Pick a starter uniformly at random, never `previous` unless it is the only one
    pub fn pick_excluding(&self, previous: Option<&str>) -> String {
        let candidates: Vec<&String> = self
            .prompts
            .iter()
            .filter(|p| Some(p.as_str()) != previous)
            .collect();

        let mut rng = rand::thread_rng();
        match candidates.choose(&mut rng) {
            Some(choice) => (*choice).clone(),
            None => self.prompts[0].clone(),
        }
    }
}

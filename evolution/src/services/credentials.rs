//! Environment-based credential loading
//!
//! Keys are read from the process environment after loading a `.env` file
//! from the current directory or its parents, if one exists. Which keys are
//! required depends on the configuration:
//!
//! - `HF_TOKEN`: hosted image backend
//! - `DEEPSEEK_API_KEY`: `delegated` merge strategy
//! - `AKASWAP_PARTNER_ID`, `AKASWAP_PARTNER_SECRET`: publishing

use std::collections::HashMap;

use shared::{EvolutionConfig, MergeStrategyKind};
use crate::error::{EvolutionError, EvolutionResult};
use crate::traits::CredentialSource;

pub const HF_TOKEN: &str = "HF_TOKEN";
pub const DEEPSEEK_API_KEY: &str = "DEEPSEEK_API_KEY";
pub const AKASWAP_PARTNER_ID: &str = "AKASWAP_PARTNER_ID";
pub const AKASWAP_PARTNER_SECRET: &str = "AKASWAP_PARTNER_SECRET";

const ALL_KEYS: &[&str] = &[HF_TOKEN, DEEPSEEK_API_KEY, AKASWAP_PARTNER_ID, AKASWAP_PARTNER_SECRET];

/// Keys the configured backends cannot run without
pub fn required_keys(config: &EvolutionConfig, uses_http_backend: bool) -> Vec<String> {
    let mut keys = Vec::new();
    if uses_http_backend {
        keys.push(HF_TOKEN.to_string());
    }
    if config.prompt_merge_strategy == MergeStrategyKind::Delegated {
        keys.push(DEEPSEEK_API_KEY.to_string());
    }
    if config.publish.enabled {
        keys.push(AKASWAP_PARTNER_ID.to_string());
        keys.push(AKASWAP_PARTNER_SECRET.to_string());
    }
    keys
}

/// Known keys that are loaded when present but not required
pub fn optional_keys(required: &[String]) -> Vec<String> {
    ALL_KEYS
        .iter()
        .filter(|key| !required.iter().any(|r| r == *key))
        .map(|key| key.to_string())
        .collect()
}

/// Resolve keys through `lookup`; blank values count as missing
pub fn resolve_credentials<F>(required: &[String], optional: &[String], lookup: F) -> EvolutionResult<HashMap<String, String>>
where
    F: Fn(&str) -> Option<String>,
{
    let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    let mut credentials = HashMap::new();

    for key in required {
        let value = present(key).ok_or_else(|| EvolutionError::MissingCredential { key: key.clone() })?;
        credentials.insert(key.clone(), value);
    }
    for key in optional {
        if let Some(value) = present(key) {
            credentials.insert(key.clone(), value);
        }
    }
    Ok(credentials)
}

/// Real credential source using environment variables
pub struct EnvCredentialSource;

impl EnvCredentialSource {
    /// Load `.env` if present; variables already set take precedence
    fn init_env() {
        let _ = dotenv::dotenv();
    }
}

#[async_trait::async_trait]
impl CredentialSource for EnvCredentialSource {
    async fn load(&self, required: &[String], optional: &[String]) -> EvolutionResult<HashMap<String, String>> {
        Self::init_env();
        resolve_credentials(required, optional, |key| std::env::var(key).ok())
    }
}

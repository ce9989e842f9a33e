//! Evolution configuration surface
//!
//! The bot reads an optional JSON file and merges it over the built-in
//! defaults: missing keys fall back to defaults, unknown keys are kept in
//! [`EvolutionConfig::extra`]. Only a validated configuration reaches the
//! engine.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{SharedError, SharedResult};
use crate::types::{MetaSignal, QualityLevel};

/// How feedback is folded into the next prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategyKind {
    Append,
    Delegated,
}

impl std::str::FromStr for MergeStrategyKind {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "append" => Ok(MergeStrategyKind::Append),
            "delegated" => Ok(MergeStrategyKind::Delegated),
            other => Err(SharedError::invalid_config("prompt_merge_strategy", other)),
        }
    }
}

/// Chat tags bound to the reserved meta signals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaSignalNames {
    pub finish: String,
    pub upgrade_quality: String,
    pub restart: String,
}

impl Default for MetaSignalNames {
    fn default() -> Self {
        Self {
            finish: "🏁".to_string(),
            upgrade_quality: "⬆️".to_string(),
            restart: "🔄".to_string(),
        }
    }
}

/// Marketplace publishing of finalized artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    pub enabled: bool,
    /// Wallet address that receives the minted token
    pub receiver_identity: String,
    pub name_prefix: String,
    pub description: String,
    pub endpoint: String,
    pub contract: String,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            receiver_identity: String::new(),
            name_prefix: "Evolution".to_string(),
            description: "Community-evolved image".to_string(),
            endpoint: "https://testnets.akaswap.com/api/v2".to_string(),
            contract: "KT1BgHYwDH1GyHUcyfz8Ykfzuz7KvpRuAz1v".to_string(),
        }
    }
}

/// OpenAI-compatible chat endpoint used by the delegated merge strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriterSettings {
    pub endpoint: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for RewriterSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.deepseek.com/v1/chat/completions".to_string(),
            model: "deepseek-chat".to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Hosted text-to-image inference endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api-inference.huggingface.co/models/black-forest-labs/FLUX.1-schnell".to_string(),
            timeout_seconds: 120,
        }
    }
}

/// Effective configuration of one evolution engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    /// `None` disables the round limit
    pub max_rounds: Option<u32>,
    pub seconds_per_round: u64,
    pub prompt_merge_strategy: MergeStrategyKind,
    pub quality_levels: Vec<String>,
    pub approve_signal_name: String,
    pub meta_signal_names: MetaSignalNames,
    pub starter_prompts: Vec<String>,
    pub retain_superseded_artifacts: bool,
    /// Classify as soon as feedback arrives instead of waiting for the next tick
    pub evaluate_on_feedback: bool,
    pub artifact_dir: PathBuf,
    pub publish: PublishSettings,
    pub rewriter: RewriterSettings,
    pub backend: BackendSettings,
    /// Keys this version does not recognize, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_seconds: 10,
            max_rounds: Some(20),
            seconds_per_round: 60,
            prompt_merge_strategy: MergeStrategyKind::Append,
            quality_levels: vec!["low".to_string(), "medium".to_string(), "high".to_string()],
            approve_signal_name: "❤️".to_string(),
            meta_signal_names: MetaSignalNames::default(),
            starter_prompts: vec![
                "a mysterious robot in a garden".to_string(),
                "an abstract digital landscape".to_string(),
                "a futuristic city at night".to_string(),
                "a geometric pattern with bright colors".to_string(),
                "a cyberpunk scene with neon lights".to_string(),
            ],
            retain_superseded_artifacts: false,
            evaluate_on_feedback: true,
            artifact_dir: PathBuf::from("./artifacts"),
            publish: PublishSettings::default(),
            rewriter: RewriterSettings::default(),
            backend: BackendSettings::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl EvolutionConfig {
    /// Merge a JSON document over the defaults and validate the result
    pub fn from_json_str(json: &str) -> SharedResult<Self> {
        let config: EvolutionConfig = serde_json::from_str(json).map_err(|e| SharedError::DeserializationError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, or use the defaults when no path is given
    pub fn load(path: Option<&Path>) -> SharedResult<Self> {
        match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| SharedError::ConfigRead {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                Self::from_json_str(&contents)
            }
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn validate(&self) -> SharedResult<()> {
        if self.max_retries == 0 {
            return Err(SharedError::invalid_config("max_retries", "0"));
        }
        if self.seconds_per_round == 0 {
            return Err(SharedError::invalid_config("seconds_per_round", "0"));
        }
        if self.quality_levels.is_empty() {
            return Err(SharedError::invalid_config("quality_levels", "[]"));
        }
        if self.starter_prompts.iter().all(|p| p.trim().is_empty()) {
            return Err(SharedError::invalid_config("starter_prompts", "[]"));
        }
        if self.max_rounds == Some(0) {
            return Err(SharedError::invalid_config("max_rounds", "0"));
        }

        let reserved = [
            ("approve_signal_name", &self.approve_signal_name),
            ("meta_signal_names.finish", &self.meta_signal_names.finish),
            ("meta_signal_names.upgrade_quality", &self.meta_signal_names.upgrade_quality),
            ("meta_signal_names.restart", &self.meta_signal_names.restart),
        ];
        let mut seen = HashSet::new();
        for (field, name) in reserved {
            if name.trim().is_empty() {
                return Err(SharedError::invalid_config(field, "\"\""));
            }
            if !seen.insert(name.as_str()) {
                return Err(SharedError::invalid_config(field, name.clone()));
            }
        }

        if self.publish.enabled && self.publish.receiver_identity.trim().is_empty() {
            return Err(SharedError::invalid_config("publish.receiver_identity", "\"\""));
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }

    pub fn round_interval(&self) -> Duration {
        Duration::from_secs(self.seconds_per_round)
    }

    /// Resolve a chat tag to the meta signal it is bound to, if any
    pub fn meta_signal_for(&self, name: &str) -> Option<MetaSignal> {
        if name == self.approve_signal_name {
            Some(MetaSignal::Approve)
        } else if name == self.meta_signal_names.finish {
            Some(MetaSignal::Finish)
        } else if name == self.meta_signal_names.upgrade_quality {
            Some(MetaSignal::UpgradeQuality)
        } else if name == self.meta_signal_names.restart {
            Some(MetaSignal::Restart)
        } else {
            None
        }
    }

    /// Tags the presenter attaches to every posted artifact
    pub fn affordances(&self) -> Vec<String> {
        vec![
            self.approve_signal_name.clone(),
            self.meta_signal_names.upgrade_quality.clone(),
            self.meta_signal_names.finish.clone(),
            self.meta_signal_names.restart.clone(),
        ]
    }

    /// `validate` rejects an empty ladder; an unvalidated one falls back to "default"
    pub fn lowest_quality(&self) -> QualityLevel {
        let name = self.quality_levels.first().map_or("default", String::as_str);
        QualityLevel::new(0, name)
    }

    /// Next level up, or `None` when already at the top
    pub fn next_quality(&self, current: &QualityLevel) -> Option<QualityLevel> {
        let index = current.index + 1;
        self.quality_levels
            .get(index)
            .map(|name| QualityLevel::new(index, name.clone()))
    }
}

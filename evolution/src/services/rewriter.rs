//! OpenAI-compatible chat completion rewriter

use std::time::Duration;
use async_trait::async_trait;
use tracing::debug;

use shared::{FeedbackSignals, RewriterSettings};
use crate::error::{EvolutionError, EvolutionResult};
use crate::traits::PromptRewriter;

const INSTRUCTIONS: &str = "You improve text-to-image prompts using community reactions.\n\
Reactions arrive as a JSON object mapping a tag (usually an emoji) to a vote count.\n\
Rewrite the prompt so each reaction shapes the scene in proportion to its count: \
a heavily voted tag should dominate, a lightly voted one should only hint.\n\
Interpret the tags creatively and never copy them into the prompt.\n\
Stay close to the original subject and answer with the new prompt only, without quotes.";

/// Build the user message sent to the model
pub fn build_rewrite_message(prompt: &str, signals: &FeedbackSignals) -> EvolutionResult<String> {
    let reactions = serde_json::to_string(signals)?;
    Ok(format!("{INSTRUCTIONS}\n\nprompt=\"{prompt}\"\nreactions={reactions}\n"))
}

/// Rewriter backed by a chat completions endpoint (DeepSeek by default)
pub struct ChatRewriter {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl ChatRewriter {
    pub fn new(settings: &RewriterSettings, api_key: impl Into<String>) -> EvolutionResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| EvolutionError::config(format!("rewriter client: {e}")))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl PromptRewriter for ChatRewriter {
    async fn rewrite(&self, prompt: &str, signals: &FeedbackSignals) -> EvolutionResult<String> {
        let request_body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": build_rewrite_message(prompt, signals)?
                }
            ],
            "max_tokens": 1024,
            "temperature": 0.7
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| EvolutionError::rewrite(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EvolutionError::rewrite(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EvolutionError::rewrite(format!("invalid response body: {e}")))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| EvolutionError::rewrite("response has no message content"))?;

        debug!("🧠 Rewriter answered with {} chars", content.len());
        Ok(content.to_string())
    }
}

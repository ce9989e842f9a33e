//! Hosted text-to-image inference client

use std::time::Duration;
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use shared::BackendSettings;
use crate::error::{BackendError, GeneratorError, GeneratorResult};
use crate::traits::GenerationClient;
use crate::types::{GenerationRequest, QualityProfile};

/// Phrases inference endpoints use while a model is overloaded or warming up
const TRANSIENT_MARKERS: &[&str] = &["busy", "overloaded", "capacity", "loading", "rate limit", "timeout"];

/// True when an error body describes a condition that should clear on its own
pub fn is_transient_message(text: &str) -> bool {
    let lowered = text.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Classify a non-success HTTP response
pub fn classify_failure(status: StatusCode, body: &str) -> BackendError {
    let message = format!("HTTP {}: {}", status.as_u16(), body.trim());
    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE || is_transient_message(body) {
        BackendError::transient(message)
    } else {
        BackendError::fatal(message)
    }
}

/// Real generation client posting prompts to an inference endpoint
pub struct HttpImageClient {
    client: reqwest::Client,
    endpoint: String,
    api_token: String,
}

impl HttpImageClient {
    pub fn new(settings: &BackendSettings, api_token: impl Into<String>) -> GeneratorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| GeneratorError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_token: api_token.into(),
        })
    }
}

#[async_trait]
impl GenerationClient for HttpImageClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u8>, BackendError> {
        let profile = QualityProfile::for_level(&request.quality);
        let request_body = serde_json::json!({
            "inputs": request.prompt,
            "parameters": {
                "width": profile.width,
                "height": profile.height,
                "num_inference_steps": profile.steps
            }
        });

        debug!("📤 Requesting {}x{} image ({} steps)", profile.width, profile.height, profile.steps);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    BackendError::transient(format!("request failed: {e}"))
                } else {
                    BackendError::fatal(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::transient(format!("failed to read image body: {e}")))?;

        if bytes.is_empty() {
            return Err(BackendError::fatal("backend returned an empty image"));
        }
        Ok(bytes.to_vec())
    }
}

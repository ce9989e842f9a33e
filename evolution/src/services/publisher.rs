//! akaSwap marketplace publisher
//!
//! Publishing is two calls authenticated with partner credentials: upload JPEG
//! renditions of the image to IPFS through `/ipfs/tokens`, then mint an FA2
//! token referencing the returned URIs through `/fa2tokens/{contract}`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use tracing::debug;

use generator::{Rendition, jpeg_rendition};
use shared::PublishSettings;
use crate::error::{EvolutionError, EvolutionResult};
use crate::traits::{PublishReceipt, PublishRequest, PublisherClient};

/// Token ids must fit a signed 32-bit integer
const TOKEN_ID_MODULUS: i64 = 2_147_483_647;
const ROYALTY_SHARE: u32 = 10;
const RENDITION_MIME: &str = "image/jpeg";

/// Token id used when the upload response does not assign one
pub fn fallback_token_id(now_millis: i64) -> String {
    now_millis.rem_euclid(TOKEN_ID_MODULUS).to_string()
}

fn token_id_from(ipfs: &Value) -> Option<String> {
    match &ipfs["tokenId"] {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn media(ipfs: &Value, key: &str, default_mime: &str) -> EvolutionResult<Value> {
    let uri = ipfs[key]["uri"]
        .as_str()
        .ok_or_else(|| EvolutionError::publish(format!("IPFS response is missing {key}.uri")))?;
    let mime = ipfs[key]["mimeType"].as_str().unwrap_or(default_mime);
    Ok(json!({ "uri": uri, "mimeType": mime }))
}

/// Build the mint request body from the IPFS upload response
pub fn build_mint_body(token_id: &str, ipfs: &Value, request: &PublishRequest, default_mime: &str) -> EvolutionResult<Value> {
    let receiver = request.receiver_identity.as_str();
    Ok(json!({
        "tokenId": token_id,
        "address": receiver,
        "amount": 1,
        "name": request.name,
        "description": request.description,
        "tags": ["imagevolve", "ai-generated", "community"],
        "symbol": "EVOLVE",
        "isMint": true,
        "mint": { "address": receiver, "amount": 1 },
        "transferable": true,
        "artifact": media(ipfs, "artifact", default_mime)?,
        "display": media(ipfs, "display", default_mime)?,
        "thumbnail": media(ipfs, "thumbnail", default_mime)?,
        "creators": [receiver],
        "royalties": {
            "decimals": 2,
            "shares": { receiver: ROYALTY_SHARE }
        },
        "attributes": [
            { "name": "generator", "value": "imagevolve" },
            { "name": "consensus", "value": "community_approved" }
        ]
    }))
}

/// Real publisher client talking to the akaSwap partner API
pub struct AkaSwapPublisher {
    client: reqwest::Client,
    api_base: String,
    contract: String,
    partner_id: String,
    partner_secret: String,
}

impl AkaSwapPublisher {
    pub fn new(settings: &PublishSettings, partner_id: impl Into<String>, partner_secret: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: settings.endpoint.trim_end_matches('/').to_string(),
            contract: settings.contract.clone(),
            partner_id: partner_id.into(),
            partner_secret: partner_secret.into(),
        }
    }

    fn part(jpeg: Vec<u8>, rendition: Rendition) -> EvolutionResult<Part> {
        Part::bytes(jpeg)
            .file_name(rendition.file_name())
            .mime_str(RENDITION_MIME)
            .map_err(|e| EvolutionError::publish(format!("invalid mime type: {e}")))
    }

    /// Upload the artifact, display and thumbnail renditions in one form
    async fn upload_to_ipfs(&self, image: Vec<u8>) -> EvolutionResult<Value> {
        let renditions = tokio::task::spawn_blocking(move || {
            Rendition::ALL
                .into_iter()
                .map(|rendition| {
                    jpeg_rendition(&image, rendition.max_side)
                        .map(|jpeg| (rendition, jpeg))
                        .map_err(|e| EvolutionError::publish(format!("could not prepare {}: {e}", rendition.label)))
                })
                .collect::<EvolutionResult<Vec<_>>>()
        })
        .await
        .map_err(|e| EvolutionError::publish(format!("rendition task failed: {e}")))??;

        let mut form = Form::new();
        for (rendition, jpeg) in renditions {
            let field = if rendition == Rendition::ARTIFACT { "artifacts" } else { rendition.label };
            debug!("🖼️ {} rendition is {} bytes", rendition.label, jpeg.len());
            form = form.part(field, Self::part(jpeg, rendition)?);
        }

        let response = self
            .client
            .post(format!("{}/ipfs/tokens", self.api_base))
            .basic_auth(&self.partner_id, Some(&self.partner_secret))
            .multipart(form)
            .send()
            .await
            .map_err(|e| EvolutionError::publish(format!("IPFS upload request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EvolutionError::publish(format!(
                "IPFS upload failed: {} - {}",
                status.as_u16(),
                body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| EvolutionError::publish(format!("invalid IPFS response: {e}")))
    }

    async fn mint(&self, body: &Value) -> EvolutionResult<Value> {
        let response = self
            .client
            .post(format!("{}/fa2tokens/{}", self.api_base, self.contract))
            .basic_auth(&self.partner_id, Some(&self.partner_secret))
            .json(body)
            .send()
            .await
            .map_err(|e| EvolutionError::publish(format!("mint request failed: {e}")))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(EvolutionError::publish(format!("minting failed: {} - {}", status.as_u16(), text)));
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

#[async_trait]
impl PublisherClient for AkaSwapPublisher {
    async fn publish(&self, mut request: PublishRequest) -> EvolutionResult<PublishReceipt> {
        let ipfs = self.upload_to_ipfs(std::mem::take(&mut request.image)).await?;
        debug!("📦 IPFS upload response: {}", ipfs);

        let token_id = token_id_from(&ipfs).unwrap_or_else(|| fallback_token_id(chrono::Utc::now().timestamp_millis()));
        let body = build_mint_body(&token_id, &ipfs, &request, RENDITION_MIME)?;
        let mint = self.mint(&body).await?;

        Ok(PublishReceipt {
            success: true,
            token_id,
            receipt: json!({ "ipfs": ipfs, "mint": mint }),
        })
    }
}

//! Tests for AkaSwapPublisher service

use image::{GenericImageView, Rgb, RgbImage};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use generator::imaging::encode_png;
use shared::PublishSettings;
use crate::services::publisher::{AkaSwapPublisher, build_mint_body, fallback_token_id};
use crate::traits::{PublishRequest, PublisherClient};

const BASIC_AUTH: &str = "Basic cGFydG5lcjpzZWNyZXQ=";

fn publisher_for(server: &MockServer) -> AkaSwapPublisher {
    let settings = PublishSettings {
        enabled: true,
        receiver_identity: "tz1receiver".to_string(),
        endpoint: format!("{}/api/v2/", server.uri()),
        contract: "KT1contract".to_string(),
        ..PublishSettings::default()
    };
    AkaSwapPublisher::new(&settings, "partner", "secret")
}

fn request() -> PublishRequest {
    PublishRequest {
        image: encode_png(&RgbImage::from_pixel(600, 300, Rgb([200, 40, 90]))).unwrap(),
        name: "Evolution 1234abcd".to_string(),
        description: "Community-evolved image".to_string(),
        receiver_identity: "tz1receiver".to_string(),
    }
}

fn ipfs_response(token_id: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "artifact": { "uri": "ipfs://artifact", "mimeType": "image/png" },
        "display": { "uri": "ipfs://display" },
        "thumbnail": { "uri": "ipfs://thumb", "mimeType": "image/png" }
    });
    if let Some(id) = token_id {
        body["tokenId"] = serde_json::json!(id);
    }
    body
}

#[tokio::test]
async fn test_upload_then_mint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/ipfs/tokens"))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(ipfs_response(Some("777"))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/fa2tokens/KT1contract"))
        .and(header("authorization", BASIC_AUTH))
        .and(body_partial_json(serde_json::json!({
            "tokenId": "777",
            "address": "tz1receiver",
            "isMint": true,
            "artifact": { "uri": "ipfs://artifact" },
            "royalties": { "decimals": 2, "shares": { "tz1receiver": 10 } }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "transactionHash": "oo123" })))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = publisher_for(&server).publish(request()).await.unwrap();
    assert!(receipt.success);
    assert_eq!(receipt.token_id, "777");
    assert_eq!(receipt.receipt["mint"]["transactionHash"], "oo123");
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Payload of the multipart part uploaded under `file_name`
fn uploaded_part(body: &[u8], file_name: &str) -> Vec<u8> {
    let start = find(body, format!("filename=\"{file_name}\"").as_bytes()).unwrap();
    let headers = &body[start..];
    let header_end = find(headers, b"\r\n\r\n").unwrap();
    assert!(find(&headers[..header_end], b"image/jpeg").is_some());

    let payload = &headers[header_end + 4..];
    let end = find(payload, b"\r\n--").unwrap();
    payload[..end].to_vec()
}

#[tokio::test]
async fn test_uploads_jpeg_renditions_at_each_size() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/ipfs/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ipfs_response(Some("5"))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/fa2tokens/KT1contract"))
        .and(body_partial_json(serde_json::json!({
            "display": { "uri": "ipfs://display", "mimeType": "image/jpeg" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    publisher_for(&server).publish(request()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let upload = &requests[0].body;
    let sizes: Vec<_> = ["artifact.jpg", "display.jpg", "thumbnail.jpg"]
        .iter()
        .map(|name| {
            let jpeg = uploaded_part(upload, name);
            assert_eq!(image::guess_format(&jpeg).unwrap(), image::ImageFormat::Jpeg);
            image::load_from_memory(&jpeg).unwrap().dimensions()
        })
        .collect();
    assert_eq!(sizes, vec![(600, 300), (600, 300), (256, 128)]);
}

#[tokio::test]
async fn test_undecodable_image_fails_before_upload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut bad = request();
    bad.image = b"not an image".to_vec();
    let error = publisher_for(&server).publish(bad).await.unwrap_err();
    assert!(error.to_string().contains("could not prepare artifact"));
}

#[tokio::test]
async fn test_failed_upload_is_a_publish_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/ipfs/tokens"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad partner"))
        .mount(&server)
        .await;

    let error = publisher_for(&server).publish(request()).await.unwrap_err();
    assert!(error.to_string().contains("401"));
}

#[tokio::test]
async fn test_missing_token_id_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/ipfs/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ipfs_response(None)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/fa2tokens/KT1contract"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let receipt = publisher_for(&server).publish(request()).await.unwrap();
    let token: i64 = receipt.token_id.parse().unwrap();
    assert!((0..2_147_483_647).contains(&token));
}

#[test]
fn test_fallback_token_id_fits_int32() {
    assert_eq!(fallback_token_id(2_147_483_647), "0");
    assert_eq!(fallback_token_id(2_147_483_650), "3");
    assert_eq!(fallback_token_id(42), "42");
}

#[test]
fn test_mint_body_defaults_mime_and_rejects_missing_uris() {
    let body = build_mint_body("1", &ipfs_response(None), &request(), "image/png").unwrap();
    assert_eq!(body["display"]["mimeType"], "image/png");
    assert_eq!(body["creators"][0], "tz1receiver");

    let incomplete = serde_json::json!({ "artifact": { "uri": "ipfs://a" } });
    assert!(build_mint_body("1", &incomplete, &request(), "image/png").is_err());
}

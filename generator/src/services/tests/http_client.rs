//! Tests for HttpImageClient service

use reqwest::StatusCode;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared::{BackendSettings, QualityLevel, SessionId};
use crate::error::BackendErrorKind;
use crate::services::http_client::{HttpImageClient, classify_failure, is_transient_message};
use crate::traits::GenerationClient;
use crate::types::GenerationRequest;

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn client_for(server: &MockServer) -> HttpImageClient {
    let settings = BackendSettings {
        endpoint: format!("{}/models/flux", server.uri()),
        timeout_seconds: 5,
    };
    HttpImageClient::new(&settings, "hf_test").unwrap()
}

fn request(quality: usize) -> GenerationRequest {
    GenerationRequest::new(SessionId::new(), "a futuristic city at night", QualityLevel::new(quality, "q"))
}

#[tokio::test]
async fn test_successful_generation_returns_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/flux"))
        .and(header("authorization", "Bearer hf_test"))
        .and(body_partial_json(serde_json::json!({
            "inputs": "a futuristic city at night",
            "parameters": { "width": 768, "height": 768 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_BYTES.to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let bytes = client_for(&server).generate(&request(1)).await.unwrap();
    assert_eq!(bytes, PNG_BYTES);
}

#[tokio::test]
async fn test_service_unavailable_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Model is currently loading"))
        .mount(&server)
        .await;

    let error = client_for(&server).generate(&request(0)).await.unwrap_err();
    assert_eq!(error.kind, BackendErrorKind::Transient);
    assert!(error.message.contains("503"));
}

#[tokio::test]
async fn test_unauthorized_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials in Authorization header"))
        .mount(&server)
        .await;

    let error = client_for(&server).generate(&request(0)).await.unwrap_err();
    assert_eq!(error.kind, BackendErrorKind::Fatal);
}

#[tokio::test]
async fn test_empty_body_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let error = client_for(&server).generate(&request(0)).await.unwrap_err();
    assert_eq!(error.kind, BackendErrorKind::Fatal);
}

#[test]
fn test_busy_text_is_transient_regardless_of_status() {
    assert!(is_transient_message("The server is too busy right now"));
    assert!(is_transient_message("Model OVERLOADED"));
    assert!(!is_transient_message("prompt rejected by safety filter"));

    let busy = classify_failure(StatusCode::INTERNAL_SERVER_ERROR, "worker at capacity");
    assert!(busy.is_transient());
    let limited = classify_failure(StatusCode::TOO_MANY_REQUESTS, "");
    assert!(limited.is_transient());
    let bad = classify_failure(StatusCode::BAD_REQUEST, "invalid parameters");
    assert!(!bad.is_transient());
}

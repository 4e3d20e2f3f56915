// tests/gemini_classifier.rs
//
// Gemini provider against a local mock server: request shape, reply
// unwrapping, and error mapping.

use moderation_analyzer::analyze::classifier::{
    ClassifierClient, ClassifierError, GeminiClassifier,
};
use moderation_analyzer::analyze::{AnalysisRequest, GenerationSettings};
use moderation_analyzer::config::ClassifierConfig;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_PATH: &str = "/models/gemini-test:generateContent";

fn config(server: &MockServer) -> ClassifierConfig {
    ClassifierConfig {
        model: "gemini-test".to_string(),
        api_key: "test-key".to_string(),
        base_url: server.uri(),
        timeout_secs: 5,
        ..ClassifierConfig::default()
    }
}

fn request(content: &str) -> AnalysisRequest {
    AnalysisRequest::new(content, &GenerationSettings::default())
}

#[tokio::test]
async fn sends_generation_config_and_joins_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": { "maxOutputTokens": 1200 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "{\"classification\":" },
                    { "text": "\"Disinformation\"}" }
                ]},
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClassifier::new(&config(&server)).unwrap();
    let text = client.classify(&request("claim")).await.unwrap();
    assert_eq!(text, r#"{"classification":"Disinformation"}"#);
}

#[tokio::test]
async fn prompt_carries_content_verbatim() {
    let server = MockServer::start().await;
    let content = "Drinking bleach cures flu";
    let expected = request(content);
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{ "text": expected.prompt() }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClassifier::new(&config(&server)).unwrap();
    assert_eq!(client.classify(&expected).await.unwrap(), "ok");
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let client = GeminiClassifier::new(&config(&server)).unwrap();
    match client.classify(&request("x")).await {
        Err(ClassifierError::Status { status, body }) => {
            assert_eq!(status, 429);
            assert!(body.contains("quota"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn blocked_or_empty_candidates_are_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        })))
        .mount(&server)
        .await;

    let client = GeminiClassifier::new(&config(&server)).unwrap();
    assert!(matches!(
        client.classify(&request("x")).await,
        Err(ClassifierError::EmptyReply)
    ));
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client = GeminiClassifier::new(&config(&server)).unwrap();
    assert!(matches!(
        client.classify(&request("x")).await,
        Err(ClassifierError::Decode(_))
    ));
}

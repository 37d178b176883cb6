//! Integration tests for the Gemini location classifier.

use streetcred_client::{GeminiClassifier, GeminiConfig};
use streetcred_core::Coordinates;
use streetcred_rewards::{ClassifierError, LocationClassifier};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.0-flash-exp:generateContent";

fn classifier(server: &MockServer) -> GeminiClassifier {
    let config = GeminiConfig::local_mock(&server.uri(), "g-key").expect("config");
    GeminiClassifier::from_config(config).expect("classifier build")
}

fn answer(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]
    }))
}

fn times_square() -> Coordinates {
    Coordinates::new(40.758, -73.9855).expect("coords")
}

#[tokio::test]
async fn classify_canonicalizes_answer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "g-key"))
        .respond_with(answer("  \"times square.\"\n"))
        .expect(1)
        .mount(&server)
        .await;

    let name = classifier(&server)
        .classify(&times_square())
        .await
        .expect("classify");
    assert_eq!(name, "Times Square");
}

#[tokio::test]
async fn prompt_carries_query_coordinates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(answer("Midtown"))
        .expect(1)
        .mount(&server)
        .await;

    classifier(&server)
        .classify(&times_square())
        .await
        .expect("classify");

    let requests = server.received_requests().await.expect("recording enabled");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json body");
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text");
    assert!(prompt.contains("[40.758, -73.9855]"));
    assert!(prompt.contains("Times Square"));
}

#[tokio::test]
async fn unknown_names_pass_through() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(answer("Red Hook"))
        .mount(&server)
        .await;

    let name = classifier(&server)
        .classify(&times_square())
        .await
        .expect("classify");
    assert_eq!(name, "Red Hook");
}

#[tokio::test]
async fn empty_answer_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": []
        })))
        .mount(&server)
        .await;

    let err = classifier(&server)
        .classify(&times_square())
        .await
        .expect_err("empty answer");
    assert!(matches!(err, ClassifierError::EmptyResponse));
}

#[tokio::test]
async fn api_failure_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
        .expect(1)
        .mount(&server)
        .await;

    let err = classifier(&server)
        .classify(&times_square())
        .await
        .expect_err("429 must fail");
    match err {
        ClassifierError::Rejected(msg) => assert!(msg.contains("429")),
        other => panic!("unexpected error: {other:?}"),
    }
}

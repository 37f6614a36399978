use std::sync::Arc;

use promptgate_core::{GeminiClient, ModelConfig, ParsedReview, PromptService, ServiceError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn gemini_response(texts: &[&str]) -> serde_json::Value {
    let parts: Vec<_> = texts.iter().map(|t| json!({ "text": t })).collect();
    json!({
        "candidates": [
            {
                "content": { "role": "model", "parts": parts },
                "finishReason": "STOP",
                "index": 0
            }
        ],
        "usageMetadata": {
            "promptTokenCount": 42,
            "candidatesTokenCount": 7,
            "totalTokenCount": 49
        },
        "modelVersion": "gemini-2.5-flash"
    })
}

fn service_for(server: &MockServer) -> PromptService {
    let config = ModelConfig::builder("test-key")
        .api_base_url(server.uri())
        .timeout_secs(5)
        .build();
    let client = GeminiClient::new(&config).expect("client creation");
    PromptService::new(Arc::new(client)).expect("service creation")
}

#[tokio::test]
async fn test_translate_e2e() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": { "temperature": 0.0 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_response(&["Dear friend,"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let translated = service
        .translate_text("Hi friend", "formal British English")
        .await
        .expect("translation should succeed");
    assert_eq!(translated, "Dear friend,");

    let requests = mock_server.received_requests().await.expect("recorded requests");
    let body: serde_json::Value = requests[0].body_json().expect("json body");
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text");
    assert_eq!(body["contents"][0]["role"], "user");
    assert!(prompt.contains("Hi friend"));
    assert!(prompt.contains("formal British English"));
}

#[tokio::test]
async fn test_multi_part_response_is_joined() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(gemini_response(&["Buongiorno,", "amico. "])),
        )
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let translated = service
        .translate_text("Good morning, friend.", "Italian")
        .await
        .expect("translation should succeed");
    assert_eq!(translated, "Buongiorno, amico.");
}

#[tokio::test]
async fn test_parse_review_e2e() {
    let mock_server = MockServer::start().await;

    let answer = "```json\n{\n  \"gift\": true,\n  \"delivery_days\": 2,\n  \"price_value\": [\"Slightly more expensive than others, but worth it for the features.\"]\n}\n```";
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_response(&[answer])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let parsed = service
        .parse_review(
            "This leaf blower is amazing. It arrived in two days, just in time for my \
             wife's anniversary present. Slightly more expensive than others, but worth \
             it for the features.",
        )
        .await
        .expect("parsing should succeed");

    assert_eq!(parsed.get("gift"), Some(&json!(true)));
    assert_eq!(parsed.get("delivery_days"), Some(&json!(2)));
    assert!(parsed.get("price_value").is_some_and(|v| v.is_array()));
}

#[tokio::test]
async fn test_parse_review_unparseable_output_is_returned_raw() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(gemini_response(&["gift: maybe"])),
        )
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let parsed = service
        .parse_review("Nice kettle.")
        .await
        .expect("fallback instead of error");
    assert_eq!(
        parsed,
        ParsedReview::Raw {
            raw: "gift: maybe".into()
        }
    );
}

#[tokio::test]
async fn test_api_error_is_propagated() {
    let mock_server = MockServer::start().await;

    let error_resp = json!({
        "error": {
            "code": 400,
            "message": "API key not valid. Please pass a valid API key.",
            "status": "INVALID_ARGUMENT"
        }
    });

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(&error_resp))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let err = service
        .translate_text("Hi", "formal")
        .await
        .expect_err("should be an error");

    assert!(err.is_model_invocation());
    assert!(
        matches!(err, ServiceError::LlmApiError { status: 400, ref message } if message.contains("API key not valid")),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let err = service
        .parse_review("Arrived broken.")
        .await
        .expect_err("model failures are not absorbed");

    assert!(matches!(err, ServiceError::LlmApiError { status: 500, .. }));
    assert!(err.to_string().contains("internal error"));
}

#[tokio::test]
async fn test_response_without_candidates_normalizes_to_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let translated = service
        .translate_text("Hi", "formal")
        .await
        .expect("empty content is not an error");
    assert_eq!(translated, "");
}

#[tokio::test]
async fn test_undecodable_body_is_a_model_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let err = service
        .complete("What is 1 + 1?")
        .await
        .expect_err("should be an error");
    assert!(matches!(err, ServiceError::LlmResponseParse(_)));
}

//! Gemini client against a local mock server.

use futures::StreamExt;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use homework_helper::error::LlmError;
use homework_helper::llm::{
    ChatMessage, CompletionRequest, GeminiProvider, LlmConfig, LlmProvider, create_provider,
};

const MODEL: &str = "gemini-2.5-flash";

fn provider(server: &MockServer, key: Option<&str>) -> GeminiProvider {
    GeminiProvider::new(
        reqwest::Client::new(),
        server.uri(),
        MODEL,
        key.map(|k| SecretString::from(k.to_string())),
    )
}

fn request() -> CompletionRequest {
    CompletionRequest::new(vec![
        ChatMessage::system("You are a tutor."),
        ChatMessage::user("What is 2+2?"),
    ])
}

#[tokio::test]
async fn complete_sends_key_and_decodes_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "You are a tutor."}]},
            "contents": [{"role": "user", "parts": [{"text": "What is 2+2?"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "2+2 "}, {"text": "= 4"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server, Some("test-key"))
        .complete(request())
        .await
        .unwrap();

    assert_eq!(response.content, "2+2 = 4");
    assert_eq!(response.input_tokens, 12);
    assert_eq!(response.output_tokens, 4);
    assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
}

#[tokio::test]
async fn json_requests_carry_schema() {
    let server = MockServer::start().await;
    let schema = json!({"type": "OBJECT", "properties": {"subject": {"type": "STRING"}}});
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
        .and(body_partial_json(json!({
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema.clone()
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"subject\":\"Math\"}"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server, Some("k"))
        .complete(request().with_json_schema(schema))
        .await
        .unwrap();
    assert_eq!(response.content, r#"{"subject":"Math"}"#);
}

#[tokio::test]
async fn stream_yields_fragments_in_order() {
    let server = MockServer::start().await;
    let sse = concat!(
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"# Step 1\"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"...\"}]}}]}\n\n",
        ": keep-alive\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"x = 5\"}]},\"finishReason\":\"STOP\"}]}\n\n",
    );
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{MODEL}:streamGenerateContent")))
        .and(query_param("alt", "sse"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse),
        )
        .expect(1)
        .mount(&server)
        .await;

    let stream = provider(&server, Some("k"))
        .complete_stream(request())
        .await
        .unwrap();
    let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;

    assert_eq!(fragments, vec!["# Step 1", "...", "x = 5"]);
}

#[tokio::test]
async fn malformed_stream_event_ends_with_error() {
    let server = MockServer::start().await;
    let sse = concat!(
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"partial\"}]}}]}\n\n",
        "data: {not json\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"never seen\"}]}}]}\n\n",
    );
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{MODEL}:streamGenerateContent")))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse))
        .mount(&server)
        .await;

    let items: Vec<Result<String, LlmError>> = provider(&server, Some("k"))
        .complete_stream(request())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), "partial");
    assert!(items[1].is_err());
}

#[tokio::test]
async fn error_event_mid_stream_ends_with_error() {
    let server = MockServer::start().await;
    let sse = concat!(
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"# Step 1\"}]}}]}\n\n",
        "data: {\"error\":{\"code\":500,\"message\":\"Internal error encountered.\"}}\n\n",
    );
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{MODEL}:streamGenerateContent")))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse))
        .mount(&server)
        .await;

    let items: Vec<Result<String, LlmError>> = provider(&server, Some("k"))
        .complete_stream(request())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), "# Step 1");
    match &items[1] {
        Err(LlmError::RequestFailed { reason, .. }) => {
            assert!(reason.contains("Internal error encountered."))
        }
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn error_body_with_success_status_is_request_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": 503, "message": "The model is overloaded."}
        })))
        .mount(&server)
        .await;

    let err = provider(&server, Some("k"))
        .complete(request())
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::RequestFailed { .. }));
}

#[tokio::test]
async fn unauthorized_is_auth_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "API key not valid", "status": "UNAUTHENTICATED"}
        })))
        .mount(&server)
        .await;

    let err = provider(&server, Some("bad"))
        .complete(request())
        .await
        .unwrap_err();
    match err {
        LlmError::AuthFailed { reason, .. } => assert_eq!(reason, "API key not valid"),
        other => panic!("expected AuthFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_request_failed_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&server)
        .await;

    let err = provider(&server, Some("k"))
        .complete_stream(request())
        .await
        .err()
        .unwrap();
    match err {
        LlmError::RequestFailed { reason, .. } => {
            assert!(reason.contains("500"));
            assert!(reason.contains("backend exploded"));
        }
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_key_never_hits_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = provider(&server, None)
        .complete(request())
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::NotConfigured { .. }));
}

#[tokio::test]
async fn factory_builds_working_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/custom-model:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
        })))
        .mount(&server)
        .await;

    let llm = create_provider(&LlmConfig {
        api_key: Some(SecretString::from("k".to_string())),
        model: "custom-model".into(),
        base_url: server.uri(),
    })
    .unwrap();

    assert_eq!(llm.model_name(), "custom-model");
    assert_eq!(llm.complete(request()).await.unwrap().content, "ok");
}

use generation::{compose_prompt, CompletionClient, GenerationError, LlmConfig, OpenAiClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new(LlmConfig {
        api_key: Some("sk-test".into()),
        base_url: format!("{}/v1", server.uri()),
        timeout_secs: 5,
        ..LlmConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn sends_single_user_message_and_trims_answer() {
    let server = MockServer::start().await;
    let prompt = compose_prompt(&["6.4.6. Calibração"], "Quando calibrar?");

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 800,
            "messages": [{ "role": "user", "content": prompt }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "  Conforme item 6.4.6.  \n" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = client_for(&server).complete(&prompt).await.unwrap();
    assert_eq!(answer, "Conforme item 6.4.6.");
}

#[tokio::test]
async fn non_success_status_is_reported_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    match client_for(&server).complete("q").await {
        Err(GenerationError::Status { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn no_choices_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = client_for(&server).complete("q").await.unwrap_err();
    assert!(matches!(err, GenerationError::EmptyResponse));
}

#[tokio::test]
async fn malformed_json_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server).complete("q").await.unwrap_err();
    assert!(matches!(err, GenerationError::InvalidResponse(_)));
}

#[tokio::test]
async fn unreachable_host_is_http_error() {
    let client = OpenAiClient::new(LlmConfig {
        api_key: Some("sk-test".into()),
        base_url: "http://127.0.0.1:1/v1".into(),
        timeout_secs: 2,
        ..LlmConfig::default()
    })
    .unwrap();
    let err = client.complete("q").await.unwrap_err();
    assert!(matches!(err, GenerationError::Http(_)));
}

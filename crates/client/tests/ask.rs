use normrag_client::{render_answer, ApiClient, ClientError};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(base: &str) -> ApiClient {
    ApiClient::new(base, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn posts_question_and_parses_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_json(json!({"question": "Quando calibrar?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "question": "Quando calibrar?",
            "answer": "Conforme item 6.4.7.",
            "context_used": ["6.4.7. Calibração"],
            "documents_retrieved": 1,
            "metrics": {"retrieval_time_ms": 1.0, "generation_time_ms": 2.0, "total_time_ms": 3.0},
            "system_info": {"scenario": "s", "standard": "ISO/IEC 17025:2017", "method": "m"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client(&server.uri()).ask("  Quando calibrar?  ").await.unwrap();
    assert_eq!(reply.answer, "Conforme item 6.4.7.");
    assert_eq!(reply.documents_retrieved, 1);
    assert!(reply.generation_error.is_none());

    let text = render_answer(&reply);
    assert!(text.contains("Documento 1:\n🔹 6.4.7. Calibração..."));
}

#[tokio::test]
async fn blank_question_is_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server.uri()).ask("   ").await.unwrap_err();
    assert!(matches!(err, ClientError::EmptyQuestion));
    assert_eq!(err.to_string(), "Por favor, digite uma consulta.");
}

#[tokio::test]
async fn server_error_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "boom", "status": "failed"})),
        )
        .mount(&server)
        .await;

    let err = client(&server.uri()).ask("pergunta").await.unwrap_err();
    match err {
        ClientError::Api { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_connect_error() {
    let err = client("http://127.0.0.1:1").ask("pergunta").await.unwrap_err();
    assert!(matches!(err, ClientError::Connect(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_server_is_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Duration::from_millis(200)).unwrap();
    let err = client.ask("pergunta").await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout(_)), "got {err:?}");
}

use semantic::{semanticize, semanticize_batch, SemanticConfig, SemanticError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_config(server: &MockServer, provider: &str) -> SemanticConfig {
    SemanticConfig {
        mode: "api".into(),
        api_url: Some(format!("{}/embed", server.uri())),
        api_provider: Some(provider.into()),
        api_auth_header: Some("Bearer test-token".into()),
        normalize: false,
        ..SemanticConfig::default()
    }
}

#[tokio::test]
async fn openai_shaped_response_maps_to_documents_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "input": ["calibração", "rastreabilidade"],
            "model": "all-MiniLM-L6-v2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "embedding": [1.0, 0.0, 0.0] },
                { "embedding": [0.0, 2.0, 0.0] }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = api_config(&server, "openai");
    let docs = [("6.4", "calibração"), ("6.5", "rastreabilidade")];
    let embeddings = semanticize_batch(&docs, &cfg).await.unwrap();

    assert_eq!(embeddings.len(), 2);
    assert_eq!(embeddings[0].doc_id, "6.4");
    assert_eq!(embeddings[1].doc_id, "6.5");
    assert_eq!(embeddings[1].vector, vec![0.0, 2.0, 0.0]);
    assert_eq!(embeddings[1].embedding_dim, 3);
}

#[tokio::test]
async fn normalization_applies_to_api_vectors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[3.0, 4.0]])))
        .mount(&server)
        .await;

    let cfg = SemanticConfig {
        normalize: true,
        ..api_config(&server, "hf")
    };
    let embedding = semanticize("q", "amostras", &cfg).await.unwrap();
    assert!(embedding.normalized);
    assert!((embedding.vector[0] - 0.6).abs() < 1e-6);
    assert!((embedding.vector[1] - 0.8).abs() < 1e-6);
}

#[tokio::test]
async fn http_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = semanticize("q", "texto", &api_config(&server, "custom"))
        .await
        .unwrap_err();
    match err {
        SemanticError::Download(msg) => {
            assert!(msg.contains("503"), "got {msg}");
            assert!(msg.contains("overloaded"), "got {msg}");
        }
        other => panic!("expected download error, got {other:?}"),
    }
}

#[tokio::test]
async fn count_mismatch_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[0.1, 0.2]] })),
        )
        .mount(&server)
        .await;

    let docs = [("a", "um"), ("b", "dois")];
    let err = semanticize_batch(&docs, &api_config(&server, "custom"))
        .await
        .unwrap_err();
    assert!(matches!(err, SemanticError::Inference(_)));
}

#[tokio::test]
async fn api_mode_without_url_is_invalid_config() {
    let cfg = SemanticConfig {
        mode: "api".into(),
        api_url: None,
        ..SemanticConfig::default()
    };
    let err = semanticize("q", "texto", &cfg).await.unwrap_err();
    assert!(matches!(err, SemanticError::InvalidConfig(_)));
}

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use generation::{CompletionClient, GenerationError};
use http_body_util::BodyExt;
use index::{Document, IndexConfig, VectorIndex};
use semantic::{semanticize_batch, SemanticConfig};
use serde_json::{json, Value};
use server::{build_router, ServerConfig, ServerState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const CLAUSES: &[(&str, &str)] = &[
    ("6.4.6", "O equipamento de medição deve ser calibrado quando a exatidão ou a incerteza de medição afetar a validade dos resultados."),
    ("7.5.1", "O laboratório deve assegurar que os registros técnicos de cada atividade contenham os resultados e informações suficientes."),
    ("7.4.1", "O laboratório deve ter um procedimento para transporte, recebimento, manuseio, proteção, armazenamento e retenção de itens de ensaio."),
    ("8.4.2", "O laboratório deve implementar os controles necessários para identificação, armazenamento, proteção, backup, arquivamento, recuperação, tempo de retenção e descarte de seus registros."),
    ("6.2.5", "O laboratório deve ter procedimentos e reter registros para determinar os requisitos de competência do pessoal."),
    ("7.2.1", "O laboratório deve usar métodos e procedimentos apropriados para todas as atividades de laboratório."),
    ("4.1.1", "As atividades de laboratório devem ser realizadas de forma imparcial."),
];

struct MockLlm {
    calls: AtomicUsize,
    fail: bool,
}

impl MockLlm {
    fn answering() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for MockLlm {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GenerationError::Status {
                status: 401,
                body: "invalid api key".into(),
            });
        }
        assert!(prompt.contains("Consulta do cliente:"));
        Ok("Conforme item 6.4.6, calibre quando afetar a validade.".into())
    }

    fn model(&self) -> &str {
        "mock-gpt"
    }
}

fn embedding_config() -> SemanticConfig {
    SemanticConfig {
        mode: "fast".into(),
        embedding_dim: 8,
        ..SemanticConfig::default()
    }
}

async fn build_index(clauses: &[(&str, &str)]) -> VectorIndex {
    let cfg = embedding_config();
    let documents: Vec<Document> = clauses
        .iter()
        .map(|(title, text)| Document::new(*text).with_title(*title))
        .collect();
    let inputs: Vec<(String, String)> = documents
        .iter()
        .enumerate()
        .map(|(i, d)| (i.to_string(), d.content()))
        .collect();
    let embeddings = semanticize_batch(&inputs, &cfg).await.unwrap();

    let mut idx = VectorIndex::new(8, IndexConfig::default()).with_model_name(&cfg.model_name);
    for (doc, emb) in documents.into_iter().zip(embeddings) {
        idx.add(doc, emb.vector).unwrap();
    }
    idx.build();
    idx
}

async fn app_with(llm: Arc<MockLlm>, clauses: &[(&str, &str)]) -> Router {
    let config = ServerConfig {
        embedding: embedding_config(),
        ..ServerConfig::default()
    };
    let state = ServerState::from_parts(config, build_index(clauses).await, llm);
    build_router(Arc::new(state))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn ask(question: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/ask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "question": question }).to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn answers_with_at_most_five_documents() {
    let llm = MockLlm::answering();
    let app = app_with(llm.clone(), CLAUSES).await;

    let (status, body) = send(&app, ask("  Quando devo calibrar equipamentos de medição?  ")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question"], "Quando devo calibrar equipamentos de medição?");
    assert_eq!(
        body["answer"],
        "Conforme item 6.4.6, calibre quando afetar a validade."
    );
    assert_eq!(body["documents_retrieved"], 5);
    assert_eq!(body["context_used"].as_array().unwrap().len(), 5);
    assert_eq!(body["system_info"]["standard"], "ISO/IEC 17025:2017");
    assert_eq!(body["system_info"]["method"], "RAG (Retrieval-Augmented Generation)");
    assert!(body["metrics"]["total_time_ms"].as_f64().unwrap() >= 0.0);
    assert!(body.get("generation_error").is_none());
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn small_index_bounds_documents_retrieved() {
    let app = app_with(MockLlm::answering(), &CLAUSES[..2]).await;
    let (status, body) = send(&app, ask("registros técnicos")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documents_retrieved"], 2);
}

#[tokio::test]
async fn context_snippets_are_truncated_to_250_chars() {
    let long_text = "requisito ".repeat(60);
    let clauses = [("8.1", long_text.as_str())];
    let app = app_with(MockLlm::answering(), &clauses).await;

    let (_, body) = send(&app, ask("requisito")).await;
    let snippet = body["context_used"][0].as_str().unwrap();
    assert_eq!(snippet.chars().count(), 250);
    assert!(snippet.starts_with("8.1. requisito"));
}

#[tokio::test]
async fn blank_question_is_rejected_without_generation() {
    let llm = MockLlm::answering();
    let app = app_with(llm.clone(), CLAUSES).await;

    for question in ["", "   ", "\n\t"] {
        let (status, body) = send(&app, ask(question)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Consulta vazia" }));
    }
    assert_eq!(llm.calls(), 0);

    let (_, stats) = send(&app, get("/stats")).await;
    assert_eq!(stats["total_queries"], 0);
}

#[tokio::test]
async fn generation_failure_is_reported_in_answer() {
    let app = app_with(MockLlm::failing(), CLAUSES).await;

    let (status, body) = send(&app, ask("Por quanto tempo devo reter registros?")).await;
    assert_eq!(status, StatusCode::OK);
    let answer = body["answer"].as_str().unwrap();
    assert!(answer.starts_with("❌ Erro ao gerar resposta de consultoria: "));
    assert!(answer.contains("invalid api key"));
    assert!(body["generation_error"].as_str().unwrap().contains("401"));
    assert_eq!(body["documents_retrieved"], 5);

    let (_, stats) = send(&app, get("/stats")).await;
    assert_eq!(stats["total_queries"], 1);
    assert_eq!(stats["successful_queries"], 0);
    assert_eq!(stats["failed_generations"], 1);
}

#[tokio::test]
async fn each_query_increments_stats_by_one() {
    let app = app_with(MockLlm::answering(), CLAUSES).await;

    let (status, stats) = send(&app, get("/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_queries"], 0);
    assert_eq!(stats["queries"], json!([]));

    for expected in 1..=3 {
        send(&app, ask("Onde encontro informações sobre manuseio de amostras?")).await;
        let (_, stats) = send(&app, get("/stats")).await;
        assert_eq!(stats["total_queries"], expected);
        assert_eq!(stats["successful_queries"], expected);
    }

    let (_, stats) = send(&app, get("/stats")).await;
    let queries = stats["queries"].as_array().unwrap();
    assert_eq!(queries.len(), 3);
    assert_eq!(
        queries[0]["question"],
        "Onde encontro informações sobre manuseio de amostras?"
    );
    assert!(stats["performance"]["max_total_time_ms"].as_f64().unwrap()
        >= stats["performance"]["min_total_time_ms"].as_f64().unwrap());
}

#[tokio::test]
async fn concurrent_queries_are_all_counted() {
    let app = app_with(MockLlm::answering(), CLAUSES).await;

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move { send(&app, ask(&format!("pergunta {i}"))).await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap().0, StatusCode::OK);
    }

    let (_, stats) = send(&app, get("/stats")).await;
    assert_eq!(stats["total_queries"], 16);
}

#[tokio::test]
async fn health_is_static_and_reports_index() {
    let app = app_with(MockLlm::answering(), CLAUSES).await;

    let (status, before) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(before["status"], "healthy");
    assert_eq!(before["documents_indexed"], CLAUSES.len());
    assert_eq!(before["llm_model"], "mock-gpt");
    assert_eq!(before["total_queries"], 0);

    send(&app, ask("Quais procedimentos são obrigatórios?")).await;
    let (_, after) = send(&app, get("/health")).await;
    assert_eq!(after["status"], "healthy");
    assert_eq!(after["total_queries"], 1);
}

#[tokio::test]
async fn export_metrics_reshapes_stats() {
    let app = app_with(MockLlm::answering(), CLAUSES).await;
    send(&app, ask("Quando devo calibrar?")).await;

    let (status, body) = send(&app, get("/export-metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["llm_model"], "mock-gpt");
    assert_eq!(body["report"]["embedding_model"], "all-MiniLM-L6-v2");
    assert_eq!(body["report"]["documents_indexed"], CLAUSES.len());
    assert!(body["report"]["generated_at"].is_string());
    assert_eq!(body["summary"]["total_queries"], 1);
    assert_eq!(body["query_details"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn root_lists_endpoints_and_unknown_routes_404() {
    let app = app_with(MockLlm::answering(), CLAUSES).await;

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert!(body["endpoints"]
        .as_array()
        .unwrap()
        .contains(&json!("/ask")));

    let (status, body) = send(&app, get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["status"], "failed");
}

#[tokio::test]
async fn metrics_without_recorder_is_404() {
    let app = app_with(MockLlm::answering(), CLAUSES).await;
    let (status, _) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mismatched_embedding_dimension_is_500() {
    let config = ServerConfig {
        embedding: SemanticConfig {
            embedding_dim: 16,
            ..embedding_config()
        },
        ..ServerConfig::default()
    };
    let llm = MockLlm::answering();
    let state = ServerState::from_parts(config, build_index(CLAUSES).await, llm.clone());
    let app = build_router(Arc::new(state));

    let (status, body) = send(&app, ask("Quando calibrar?")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["code"], "INDEX_ERROR");
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = app_with(MockLlm::answering(), CLAUSES).await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let response = app.oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

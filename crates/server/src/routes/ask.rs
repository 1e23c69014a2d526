use crate::error::{ServerError, ServerResult};
use crate::routes::{METHOD, SCENARIO, STANDARD};
use crate::state::ServerState;
use crate::stats::{round2, QueryRecord};
use axum::extract::State;
use axum::Json;
use generation::compose_prompt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Prefix of the answer when the completion call fails.
pub const GENERATION_FAILURE_PREFIX: &str = "❌ Erro ao gerar resposta de consultoria";

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    pub context_used: Vec<String>,
    pub documents_retrieved: usize,
    pub metrics: AskMetrics,
    pub system_info: SystemInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskMetrics {
    pub retrieval_time_ms: f64,
    pub generation_time_ms: f64,
    pub total_time_ms: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemInfo {
    pub scenario: String,
    pub standard: String,
    pub method: String,
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self {
            scenario: SCENARIO.into(),
            standard: STANDARD.into(),
            method: METHOD.into(),
        }
    }
}

/// Answers a question from the indexed clauses (POST /ask).
///
/// Validate, embed, retrieve, compose, generate. A failed completion still
/// answers 200: the failure is reported in `answer` and `generation_error`.
pub async fn ask(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<AskRequest>,
) -> ServerResult<Json<AskResponse>> {
    let question = request.question.trim();
    if question.is_empty() {
        metrics::counter!("normrag_ask_total", "outcome" => "empty").increment(1);
        return Err(ServerError::EmptyQuestion);
    }

    let started = Instant::now();
    let retrieval_cfg = &state.config.retrieval;

    let embedding = semantic::semanticize("query", question, &state.config.embedding).await?;
    let hits = state.index.search(&embedding.vector, retrieval_cfg.top_k)?;
    let passages: Vec<String> = hits.iter().map(|hit| hit.document.content()).collect();
    let retrieval_ms = started.elapsed().as_secs_f64() * 1000.0;

    tracing::debug!(
        documents = passages.len(),
        positions = ?hits.iter().map(|h| h.position).collect::<Vec<_>>(),
        "retrieved context"
    );

    let prompt = compose_prompt(&passages, question);
    let generation_started = Instant::now();
    let (answer, generation_error) = match state.llm.complete(&prompt).await {
        Ok(answer) => (answer, None),
        Err(err) => {
            tracing::warn!(error = %err, model = state.llm.model(), "completion failed");
            (
                format!("{GENERATION_FAILURE_PREFIX}: {err}"),
                Some(err.to_string()),
            )
        }
    };
    let generation_ms = generation_started.elapsed().as_secs_f64() * 1000.0;
    let total_ms = started.elapsed().as_secs_f64() * 1000.0;

    let success = generation_error.is_none();
    state.stats()?.record(QueryRecord {
        id: uuid::Uuid::new_v4(),
        timestamp: chrono::Utc::now(),
        question: question.to_string(),
        retrieval_time_ms: round2(retrieval_ms),
        generation_time_ms: round2(generation_ms),
        total_time_ms: round2(total_ms),
        documents_retrieved: passages.len(),
        success,
        error: generation_error.clone(),
    });

    let outcome = if success { "answered" } else { "generation_failed" };
    metrics::counter!("normrag_ask_total", "outcome" => outcome).increment(1);
    metrics::histogram!("normrag_ask_retrieval_seconds").record(retrieval_ms / 1000.0);
    metrics::histogram!("normrag_ask_generation_seconds").record(generation_ms / 1000.0);

    tracing::info!(
        documents = passages.len(),
        retrieval_ms = round2(retrieval_ms),
        generation_ms = round2(generation_ms),
        total_ms = round2(total_ms),
        success,
        "question answered"
    );

    let snippet_chars = retrieval_cfg.snippet_chars;
    Ok(Json(AskResponse {
        question: question.to_string(),
        answer,
        context_used: passages
            .iter()
            .map(|p| p.chars().take(snippet_chars).collect())
            .collect(),
        documents_retrieved: passages.len(),
        metrics: AskMetrics {
            retrieval_time_ms: round2(retrieval_ms),
            generation_time_ms: round2(generation_ms),
            total_time_ms: round2(total_ms),
        },
        system_info: SystemInfo::default(),
        generation_error,
    }))
}

use crate::error::{ServerError, ServerResult};
use crate::routes::SERVICE_NAME;
use crate::state::ServerState;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
pub(crate) static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

fn uptime_seconds() -> u64 {
    SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Health check endpoint (GET /health). The status is static.
pub async fn health_check(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let total_queries = state.stats()?.total_queries();

    Ok(Json(json!({
        "status": "healthy",
        "vector_index": "loaded",
        "embeddings_model": state.config.embedding.model_name,
        "index_model": state.index.model_name(),
        "llm_model": state.llm.model(),
        "documents_indexed": state.index.len(),
        "total_queries": total_queries,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
    })))
}

/// Cumulative performance summary plus per-query detail (GET /stats)
pub async fn stats(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let (summary, queries) = {
        let stats = state.stats()?;
        (stats.summary(), stats.records())
    };

    Ok(Json(json!({
        "total_queries": summary.total_queries,
        "successful_queries": summary.successful_queries,
        "failed_generations": summary.failed_generations,
        "performance": summary.performance,
        "queries": queries,
    })))
}

/// The same data as `/stats`, shaped as a report document (GET /export-metrics)
pub async fn export_metrics(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let (summary, queries) = {
        let stats = state.stats()?;
        (stats.summary(), stats.records())
    };

    Ok(Json(json!({
        "report": {
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "service": SERVICE_NAME,
            "llm_model": state.llm.model(),
            "embedding_model": state.config.embedding.model_name,
            "documents_indexed": state.index.len(),
            "uptime_seconds": uptime_seconds(),
        },
        "summary": summary,
        "query_details": queries,
    })))
}

/// Prometheus text exposition (GET /metrics)
pub async fn prometheus_metrics(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let handle = state
        .metrics_handle
        .as_ref()
        .filter(|_| state.config.metrics_enabled)
        .ok_or(ServerError::NotFound)?;

    Ok((
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}

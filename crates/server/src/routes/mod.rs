//! API route handlers
//!
//! - `ask`: the retrieval-augmented question endpoint
//! - `health`: health, statistics, report export and Prometheus metrics

pub mod ask;
pub mod health;

use crate::error::ServerError;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub const SERVICE_NAME: &str = "Assistente RAG para Consultoria em Qualidade Laboratorial";
pub const SCENARIO: &str = "Consultoria em Qualidade Laboratorial";
pub const STANDARD: &str = "ISO/IEC 17025:2017";
pub const METHOD: &str = "RAG (Retrieval-Augmented Generation)";

/// Service description (GET /)
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "message": format!("{SERVICE_NAME} está online! 🚀"),
        "scenario": "Consultoria técnica especializada",
        "standard": STANDARD,
        "technology": METHOD,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/ask", "/health", "/stats", "/export-metrics", "/metrics"],
        "status": "ready"
    }))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub type ServerResult<T> = Result<T, ServerError>;

/// Message returned for blank questions.
pub const EMPTY_QUESTION_MESSAGE: &str = "Consulta vazia";

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Consulta vazia")]
    EmptyQuestion,

    #[error("Embedding error: {0}")]
    Semantic(#[from] semantic::SemanticError),

    #[error("Index error: {0}")]
    Index(#[from] index::IndexError),

    #[error("Generation error: {0}")]
    Generation(#[from] generation::GenerationError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

impl ServerError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::EmptyQuestion => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Generation(_) => StatusCode::BAD_GATEWAY,
            ServerError::Semantic(_)
            | ServerError::Index(_)
            | ServerError::Internal(_)
            | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    fn error_code(&self) -> &'static str {
        match self {
            ServerError::EmptyQuestion => "EMPTY_QUESTION",
            ServerError::Semantic(_) => "EMBEDDING_ERROR",
            ServerError::Index(_) => "INDEX_ERROR",
            ServerError::Generation(_) => "GENERATION_ERROR",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // blank questions keep the bare shape clients already match on
        if matches!(self, ServerError::EmptyQuestion) {
            return (status, Json(json!({ "error": EMPTY_QUESTION_MESSAGE }))).into_response();
        }

        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": "failed",
            "code": self.error_code(),
        }));

        (status, body).into_response()
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Config(format!("Invalid address: {err}"))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

use std::io;
use thiserror::Error;

/// Errors surfaced while producing embeddings.
#[derive(Debug, Error)]
pub enum SemanticError {
    /// The ONNX model could not be located locally and no download URL was provided.
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    /// The tokenizer JSON is missing and there was no remote URL to fetch it from.
    #[error("tokenizer missing: {0}")]
    TokenizerMissing(String),
    /// Configuration is inconsistent (unknown mode, api mode without url, ...).
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    /// Remote fetch failed: model download or embedding API call.
    #[error("download failed: {0}")]
    Download(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// ONNX Runtime, tokenizer, or response-shape errors.
    #[error("inference failure: {0}")]
    Inference(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = SemanticError::ModelNotFound("/models/model.onnx".into());
        assert_eq!(err.to_string(), "model file not found: /models/model.onnx");

        let err = SemanticError::InvalidConfig("api_url is required".into());
        assert!(err.to_string().starts_with("invalid semantic config"));
    }

    #[test]
    fn io_errors_convert() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: SemanticError = io_err.into();
        assert!(matches!(err, SemanticError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }
}

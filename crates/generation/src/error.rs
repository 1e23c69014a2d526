use thiserror::Error;

/// Failures while asking the language model for an answer.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Transport failure: connection refused, timeout, TLS.
    #[error("request to the completion API failed: {0}")]
    Http(String),
    #[error("completion API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected completion response: {0}")]
    InvalidResponse(String),
    #[error("completion API returned no answer")]
    EmptyResponse,
    #[error("invalid completion client config: {0}")]
    Config(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GenerationError::InvalidResponse(err.to_string())
        } else {
            GenerationError::Http(err.to_string())
        }
    }
}

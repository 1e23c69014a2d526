use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime configuration describing which model to use and how to post-process vectors.
///
/// Every field has a default, so partial YAML/TOML sections deserialize cleanly.
///
/// # Example
/// ```no_run
/// use semantic::{semanticize, SemanticConfig};
///
/// let cfg = SemanticConfig {
///     mode: "api".into(),
///     api_url: Some("https://router.huggingface.co/hf-inference/models/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction".into()),
///     api_auth_header: Some("Bearer hf_xxx".into()),
///     api_provider: Some("hf".into()),
///     ..Default::default()
/// };
///
/// let _ = semanticize("doc123", "Requisitos gerais", &cfg);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SemanticConfig {
    /// Inference mode selector: `"onnx"` (local), `"api"` (remote HTTP), or `"fast"` (stub).
    pub mode: String,
    /// Label recorded in the index manifest and surfaced on every embedding.
    pub model_name: String,
    /// Local path of the ONNX file (also the download target when
    /// [`model_url`](Self::model_url) is set).
    pub model_path: PathBuf,
    /// Optional URL fetched when [`model_path`](Self::model_path) is missing.
    pub model_url: Option<String>,
    /// Path to `tokenizer.json`. When absent and [`tokenizer_url`](Self::tokenizer_url) is set
    /// the file is placed next to the model.
    pub tokenizer_path: Option<PathBuf>,
    /// Optional URL for fetching the tokenizer on demand.
    pub tokenizer_url: Option<String>,
    /// Feature-extraction endpoint when [`mode`](Self::mode) is `"api"`.
    pub api_url: Option<String>,
    /// Authorization header value (e.g. `"Bearer hf_xxx"`).
    pub api_auth_header: Option<String>,
    /// Remote provider hint: `"hf"`, `"openai"`, or `"custom"` (default).
    pub api_provider: Option<String>,
    /// Per-request API timeout in seconds.
    pub api_timeout_secs: Option<u64>,
    /// Output dimension of the stub. Real models report their own.
    pub embedding_dim: usize,
    /// Token budget per text; longer inputs are truncated.
    pub max_sequence_length: usize,
    /// Normalize vectors to unit length.
    pub normalize: bool,
    /// Use the stub when model assets cannot be found. Off by default.
    pub fallback_to_stub: bool,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            mode: "onnx".into(),
            model_name: "all-MiniLM-L6-v2".into(),
            model_path: PathBuf::from("./models/all-MiniLM-L6-v2/onnx/model.onnx"),
            model_url: None,
            tokenizer_path: Some(PathBuf::from("./models/all-MiniLM-L6-v2/tokenizer.json")),
            tokenizer_url: None,
            api_url: None,
            api_auth_header: None,
            api_provider: None,
            api_timeout_secs: Some(30),
            embedding_dim: 384,
            max_sequence_length: 256,
            normalize: true,
            fallback_to_stub: false,
        }
    }
}

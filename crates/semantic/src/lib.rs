//! normrag sentence embeddings
//!
//! Turns a regulatory clause (or a user question) into a dense vector so the
//! index can find passages that mean the same thing. The same configuration
//! must be used at index-build time and at query time, otherwise distances
//! between the two are meaningless.
//!
//! Three modes:
//!
//! - **ONNX mode** - Run a sentence-transformer locally (default
//!   `all-MiniLM-L6-v2`, 384 dims). Needs `model.onnx` + `tokenizer.json` and
//!   the `onnx` cargo feature.
//! - **API mode** - POST to a feature-extraction endpoint (Hugging Face,
//!   OpenAI, or anything that speaks `{"texts": [...]}`).
//! - **Fast mode** - Deterministic hash-seeded stub. No model, no network.
//!   This is what the tests run on.
//!
//! ## Threading notes
//!
//! Tokenizers and ONNX sessions are cached per thread. First call on any
//! thread pays the load, after that it's just inference.
//!
//! ## Quick example
//!
//! ```no_run
//! use semantic::{semanticize, SemanticConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cfg = SemanticConfig::default();
//!     let embedding = semanticize("q", "Quando devo calibrar equipamentos?", &cfg)
//!         .await
//!         .unwrap();
//!     assert_eq!(embedding.embedding_dim, 384);
//! }
//! ```

pub mod config;
pub mod error;
pub mod types;

mod api;
#[cfg(feature = "onnx")]
mod assets;
#[cfg(feature = "onnx")]
mod cache;
mod normalize;
#[cfg(feature = "onnx")]
mod onnx;
mod stub;

pub use crate::config::SemanticConfig;
pub use crate::error::SemanticError;
pub use crate::normalize::l2_normalize_in_place;
pub use crate::types::SemanticEmbedding;

use crate::api::semanticize_batch_via_api;
use crate::stub::make_stub_embedding;

/// Converts `text` into a [`SemanticEmbedding`] using the supplied [`SemanticConfig`].
///
/// The mode decides where the vector comes from; see the crate docs. Unknown
/// modes are rejected rather than guessed.
pub async fn semanticize(
    doc_id: &str,
    text: &str,
    cfg: &SemanticConfig,
) -> Result<SemanticEmbedding, SemanticError> {
    let docs = [(doc_id, text)];
    let mut embeddings = semanticize_batch(&docs, cfg).await?;
    embeddings
        .pop()
        .ok_or_else(|| SemanticError::Inference("no embedding produced".into()))
}

/// Batch variant of [`semanticize`]. Output order matches input order.
///
/// ONNX mode runs one padded inference over the whole batch; API mode sends a
/// single request carrying every text.
pub async fn semanticize_batch<'a, D, T>(
    docs: &'a [(D, T)],
    cfg: &SemanticConfig,
) -> Result<Vec<SemanticEmbedding>, SemanticError>
where
    D: AsRef<str> + 'a,
    T: AsRef<str> + 'a,
{
    if docs.is_empty() {
        return Ok(Vec::new());
    }

    match cfg.mode.as_str() {
        "fast" => Ok(stub_batch(docs, cfg)),
        "api" => semanticize_batch_via_api(docs, cfg).await,
        "onnx" => semanticize_batch_via_onnx(docs, cfg).await,
        other => Err(SemanticError::InvalidConfig(format!(
            "unknown embedding mode '{other}' (expected onnx, api or fast)"
        ))),
    }
}

fn stub_batch<D, T>(docs: &[(D, T)], cfg: &SemanticConfig) -> Vec<SemanticEmbedding>
where
    D: AsRef<str>,
    T: AsRef<str>,
{
    docs.iter()
        .map(|(doc_id, text)| make_stub_embedding(doc_id.as_ref(), text.as_ref(), cfg))
        .collect()
}

#[cfg(feature = "onnx")]
async fn semanticize_batch_via_onnx<D, T>(
    docs: &[(D, T)],
    cfg: &SemanticConfig,
) -> Result<Vec<SemanticEmbedding>, SemanticError>
where
    D: AsRef<str>,
    T: AsRef<str>,
{
    use crate::assets::{resolve_model_assets, should_fallback_to_stub};
    use crate::cache::get_or_load_model_handle;
    use crate::onnx::run_onnx_embeddings;

    let assets = match resolve_model_assets(cfg).await {
        Ok(assets) => assets,
        Err(err) if cfg.fallback_to_stub && should_fallback_to_stub(&err) => {
            tracing::warn!(error = %err, "model assets unavailable, using stub embeddings");
            return Ok(stub_batch(docs, cfg));
        }
        Err(err) => return Err(err),
    };

    let handle = get_or_load_model_handle(&assets)?;
    let text_refs: Vec<&str> = docs.iter().map(|(_, text)| text.as_ref()).collect();
    let vectors = run_onnx_embeddings(handle.as_ref(), &text_refs, cfg.max_sequence_length)?;
    if vectors.len() != docs.len() {
        return Err(SemanticError::Inference(format!(
            "model returned {} embeddings for {} inputs",
            vectors.len(),
            docs.len()
        )));
    }

    Ok(docs
        .iter()
        .zip(vectors)
        .map(|((doc_id, _), vector)| SemanticEmbedding::from_raw(doc_id.as_ref(), vector, cfg))
        .collect())
}

#[cfg(not(feature = "onnx"))]
async fn semanticize_batch_via_onnx<D, T>(
    docs: &[(D, T)],
    cfg: &SemanticConfig,
) -> Result<Vec<SemanticEmbedding>, SemanticError>
where
    D: AsRef<str>,
    T: AsRef<str>,
{
    if cfg.fallback_to_stub {
        tracing::warn!("built without the `onnx` feature, using stub embeddings");
        return Ok(stub_batch(docs, cfg));
    }
    Err(SemanticError::InvalidConfig(
        "onnx mode requires the `onnx` cargo feature".into(),
    ))
}

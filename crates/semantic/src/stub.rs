use fxhash::hash64;

use crate::{SemanticConfig, SemanticEmbedding};

/// Deterministic stub used in `"fast"` mode (and as the opt-in fallback).
/// Sinusoids seeded by a hash of the text: identical text gives an identical
/// vector, which is all the retrieval tests need.
pub(crate) fn make_stub_embedding(
    doc_id: &str,
    text: &str,
    cfg: &SemanticConfig,
) -> SemanticEmbedding {
    let dim = cfg.embedding_dim.max(1);
    let h = hash64(text.as_bytes());
    let vector = (0..dim)
        .map(|idx| {
            let shifted = h.rotate_right((idx % 64) as u32) >> 40;
            (shifted as f32 * 0.001 + idx as f32).sin()
        })
        .collect();
    SemanticEmbedding::from_raw(doc_id, vector, cfg)
}

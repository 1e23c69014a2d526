use serde::{Deserialize, Serialize};

use crate::normalize::l2_normalize_in_place;
use crate::SemanticConfig;

/// Embedding output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SemanticEmbedding {
    /// Identifier of the embedded passage or query.
    pub doc_id: String,
    /// Final embedding values.
    pub vector: Vec<f32>,
    /// Name of the model used to produce the vector.
    pub model_name: String,
    /// Dimension of `vector`.
    pub embedding_dim: usize,
    /// Whether [`vector`](Self::vector) was L2-normalized.
    pub normalized: bool,
}

impl SemanticEmbedding {
    /// Wraps a raw model vector, normalizing it when the config asks for it.
    pub(crate) fn from_raw(doc_id: &str, mut vector: Vec<f32>, cfg: &SemanticConfig) -> Self {
        if cfg.normalize {
            l2_normalize_in_place(&mut vector);
        }
        Self {
            doc_id: doc_id.to_string(),
            embedding_dim: vector.len(),
            vector,
            model_name: cfg.model_name.clone(),
            normalized: cfg.normalize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_normalizes_when_configured() {
        let cfg = SemanticConfig::default();
        let embedding = SemanticEmbedding::from_raw("doc-1", vec![3.0, 4.0], &cfg);

        assert_eq!(embedding.doc_id, "doc-1");
        assert_eq!(embedding.embedding_dim, 2);
        assert!(embedding.normalized);
        assert!((embedding.vector[0] - 0.6).abs() < 1e-6);
        assert!((embedding.vector[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn from_raw_keeps_values_without_normalize() {
        let cfg = SemanticConfig {
            normalize: false,
            model_name: "custom".into(),
            ..SemanticConfig::default()
        };
        let embedding = SemanticEmbedding::from_raw("doc-2", vec![3.0, 4.0], &cfg);

        assert_eq!(embedding.vector, vec![3.0, 4.0]);
        assert_eq!(embedding.model_name, "custom");
        assert!(!embedding.normalized);
    }
}

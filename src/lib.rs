//! normrag indexer.
//!
//! Reads the ISO/IEC 17025:2017 clause corpus, embeds every clause and
//! persists the resulting vector index for the query service.
//!
//! ```no_run
//! use normrag::{run, IndexerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), normrag::IndexerError> {
//!     let summary = run(&IndexerConfig::default()).await?;
//!     println!("{} documents -> {}", summary.documents, summary.location);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod corpus;

pub use crate::config::{ConfigLoadError, IndexerConfig};
pub use crate::corpus::{load_corpus, parse_corpus, CorpusError, CorpusFormat};

use index::{Document, IndexError, VectorIndex};
use indicatif::{ProgressBar, ProgressStyle};
use semantic::{semanticize_batch, SemanticError};
use thiserror::Error;

const PROGRESS_TEMPLATE: &str = "{msg} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} batches";

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    Config(#[from] ConfigLoadError),

    #[error("embedding failed: {0}")]
    Semantic(#[from] SemanticError),

    #[error("index failed: {0}")]
    Index(#[from] IndexError),

    #[error("corpus contains no indexable clauses")]
    EmptyCorpus,
}

/// What a successful [`run`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    pub documents: usize,
    pub dimension: usize,
    pub location: String,
}

fn progress_bar(batches: usize) -> ProgressBar {
    let pb = ProgressBar::new(batches as u64);
    let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    pb.set_style(style);
    pb.set_message("🔍 Gerando embeddings");
    pb
}

/// Embeds `documents` in batches of `cfg.batch_size` and builds the index.
///
/// All vectors are collected before the index is built, so a failure in any
/// batch leaves nothing behind.
pub async fn build_index(
    documents: Vec<Document>,
    cfg: &IndexerConfig,
) -> Result<VectorIndex, IndexerError> {
    if documents.is_empty() {
        return Err(IndexerError::EmptyCorpus);
    }

    let batch_size = cfg.batch_size.max(1);
    let pb = progress_bar(documents.len().div_ceil(batch_size));

    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(documents.len());
    for (batch_no, batch) in documents.chunks(batch_size).enumerate() {
        let inputs: Vec<(String, String)> = batch
            .iter()
            .enumerate()
            .map(|(i, doc)| ((batch_no * batch_size + i).to_string(), doc.content()))
            .collect();

        let embeddings = match semanticize_batch(&inputs, &cfg.embedding).await {
            Ok(embeddings) => embeddings,
            Err(err) => {
                pb.abandon();
                return Err(err.into());
            }
        };
        vectors.extend(embeddings.into_iter().map(|e| e.vector));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let dimension = vectors.first().map(Vec::len).unwrap_or(cfg.embedding.embedding_dim);
    tracing::info!(
        rows = vectors.len(),
        dimension,
        "embeddings generated: ({}, {})",
        vectors.len(),
        dimension
    );

    let mut index = VectorIndex::new(dimension, cfg.index.clone())
        .with_model_name(cfg.embedding.model_name.clone());
    for (doc, vector) in documents.into_iter().zip(vectors) {
        index.add(doc, vector)?;
    }
    index.build();
    Ok(index)
}

/// Loads the corpus, builds the index and saves it to the configured store.
pub async fn run(cfg: &IndexerConfig) -> Result<IndexSummary, IndexerError> {
    cfg.validate()?;

    let documents = load_corpus(&cfg.corpus_paths)?;
    tracing::info!(documents = documents.len(), "clauses to index");

    let index = build_index(documents, cfg).await?;

    let store = cfg.store.build()?;
    index.save(store.as_ref())?;

    let summary = IndexSummary {
        documents: index.len(),
        dimension: index.dimension(),
        location: store.location(),
    };
    tracing::info!(
        documents = summary.documents,
        dimension = summary.dimension,
        location = %summary.location,
        "vector index saved"
    );
    Ok(summary)
}

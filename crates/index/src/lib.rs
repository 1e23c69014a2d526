//! # normrag Index
//!
//! Holds the clauses of a standard together with their embedding vectors and
//! answers "which clauses are closest to this question?".
//!
//! ## Core Features
//!
//! - **Append-only collection**: [`VectorIndex::add`] pairs a [`Document`]
//!   with its vector; the pair's position is its identity.
//! - **Exact or approximate search**: a linear scan for small collections, an
//!   HNSW graph past [`AnnConfig::min_vectors_for_ann`] (see [`ann`]).
//! - **Persistence**: the whole index is bincode-encoded, zstd-compressed and
//!   written through an [`IndexStore`] next to a JSON manifest that records
//!   the embedding model and dimension it was built with.
//!
//! ## Example Usage
//!
//! ```
//! use index::{Document, IndexConfig, InMemoryStore, VectorIndex};
//!
//! let mut idx = VectorIndex::new(2, IndexConfig::default()).with_model_name("toy");
//! idx.add(Document::new("Equipamentos devem ser calibrados.").with_title("6.4.6"), vec![1.0, 0.0])
//!     .unwrap();
//! idx.add(Document::new("Registros devem ser retidos."), vec![0.0, 1.0])
//!     .unwrap();
//! idx.build();
//!
//! let hits = idx.search(&[0.9, 0.1], 1).unwrap();
//! assert_eq!(hits[0].document.content(), "6.4.6. Equipamentos devem ser calibrados.");
//!
//! let store = InMemoryStore::new();
//! idx.save(&store).unwrap();
//! let loaded = VectorIndex::load(&store, IndexConfig::default()).unwrap();
//! assert_eq!(loaded.len(), 2);
//! ```

pub mod ann;
mod store;

pub use crate::ann::{AnnConfig, Metric};
pub use crate::store::{DirectoryStore, InMemoryStore, IndexStore, StoreConfig};

use crate::ann::AnnIndex;
use bincode::config::standard;
use bincode::error::{DecodeError, EncodeError};
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zstd::{decode_all, encode_all};

/// Bump this value whenever the persisted layout changes.
pub const INDEX_SCHEMA_VERSION: u16 = 1;

/// Key of the encoded index blob inside a store.
pub const INDEX_BLOB: &str = "index.bin";
/// Key of the JSON manifest inside a store.
pub const MANIFEST_BLOB: &str = "manifest.json";

/// One clause of the standard.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub title: Option<String>,
    pub section: Option<String>,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            title: None,
            section: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// The string that gets embedded and later handed to the model as context:
    /// `"{title}. {text}"`, or just the text when there is no title.
    pub fn content(&self) -> String {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => format!("{title}. {}", self.text),
            _ => self.text.clone(),
        }
    }
}

/// Compression codec options for the index blob.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    /// No compression (useful for debugging).
    None,
    /// Zstd compression (default, good balance of speed and ratio).
    #[default]
    Zstd,
}

/// Compression behavior configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub codec: CompressionCodec,
    /// Compression level (1-22 for Zstd).
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl CompressionConfig {
    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(encode_all(data, self.level)?),
        }
    }
}

fn decompress(codec: CompressionCodec, data: &[u8]) -> Result<Vec<u8>, IndexError> {
    match codec {
        CompressionCodec::None => Ok(data.to_vec()),
        CompressionCodec::Zstd => {
            decode_all(data).map_err(|e| IndexError::Corrupt(format!("zstd: {e}")))
        }
    }
}

/// Config for building, searching and persisting an index.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Distance used when building a new index. A loaded index keeps the
    /// metric it was built with.
    pub metric: Metric,
    pub ann: AnnConfig,
    pub compression: CompressionConfig,
}

impl IndexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_ann(mut self, ann: AnnConfig) -> Self {
        self.ann = ann;
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }
}

/// Human-readable description stored beside the index blob.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IndexManifest {
    pub schema_version: u16,
    pub model_name: String,
    pub dimension: usize,
    pub metric: Metric,
    pub document_count: usize,
    pub compression: CompressionCodec,
}

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("no index found at {0}")]
    NotFound(String),
    #[error("index is corrupt: {0}")]
    Corrupt(String),
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(String),
    #[error("store error: {0}")]
    Store(String),
}

impl From<EncodeError> for IndexError {
    fn from(e: EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<DecodeError> for IndexError {
    fn from(e: DecodeError) -> Self {
        IndexError::Corrupt(e.to_string())
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    schema_version: u16,
    model_name: String,
    dimension: usize,
    metric: Metric,
    documents: Vec<Document>,
    vectors: Vec<Vec<f32>>,
}

/// A ranked hit borrowed from the index.
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    /// Position of the document in the collection.
    pub position: usize,
    /// Lower is closer.
    pub distance: f32,
    pub document: &'a Document,
}

/// Documents paired 1:1 with their vectors.
pub struct VectorIndex {
    cfg: IndexConfig,
    model_name: String,
    documents: Vec<Document>,
    ann: AnnIndex,
}

impl VectorIndex {
    /// Empty index for vectors of `dimension` components.
    pub fn new(dimension: usize, cfg: IndexConfig) -> Self {
        let ann = AnnIndex::new(dimension, cfg.metric, cfg.ann);
        Self {
            cfg,
            model_name: String::new(),
            documents: Vec::new(),
            ann,
        }
    }

    /// Records which embedding model produced the vectors.
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Appends a document with its vector. Call [`build`](Self::build) once all
    /// documents are in.
    pub fn add(&mut self, document: Document, vector: Vec<f32>) -> Result<usize, IndexError> {
        let position = self.ann.insert(vector)?;
        self.documents.push(document);
        Ok(position)
    }

    pub fn build(&mut self) {
        self.ann.build();
        tracing::info!(
            documents = self.documents.len(),
            dimension = self.ann.dimension(),
            metric = self.ann.metric().as_str(),
            ann = self.ann.uses_ann(),
            "vector index ready"
        );
    }

    /// The `k` documents closest to `query`, closest first.
    ///
    /// Returns at most `min(k, len())` hits; a query of the wrong dimension is
    /// rejected.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit<'_>>, IndexError> {
        let results = self.ann.search(query, k)?;
        Ok(results
            .into_iter()
            .filter_map(|r| {
                self.documents.get(r.index).map(|document| SearchHit {
                    position: r.index,
                    distance: r.distance,
                    document,
                })
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.ann.dimension()
    }

    pub fn metric(&self) -> Metric {
        self.ann.metric()
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        self.ann.vectors().get(position).map(Vec::as_slice)
    }

    pub fn manifest(&self) -> IndexManifest {
        IndexManifest {
            schema_version: INDEX_SCHEMA_VERSION,
            model_name: self.model_name.clone(),
            dimension: self.dimension(),
            metric: self.metric(),
            document_count: self.len(),
            compression: self.cfg.compression.codec,
        }
    }

    /// Writes the index blob and its manifest, replacing whatever was there.
    pub fn save(&self, store: &dyn IndexStore) -> Result<(), IndexError> {
        let persisted = PersistedIndex {
            schema_version: INDEX_SCHEMA_VERSION,
            model_name: self.model_name.clone(),
            dimension: self.dimension(),
            metric: self.metric(),
            documents: self.documents.clone(),
            vectors: self.ann.vectors().to_vec(),
        };
        let encoded = encode_to_vec(&persisted, standard())?;
        let payload = self.cfg.compression.compress(&encoded)?;
        let manifest = serde_json::to_vec_pretty(&self.manifest())
            .map_err(|e| IndexError::Encode(e.to_string()))?;

        store.put(INDEX_BLOB, &payload)?;
        store.put(MANIFEST_BLOB, &manifest)?;
        tracing::info!(
            location = %store.location(),
            documents = self.len(),
            bytes = payload.len(),
            "index saved"
        );
        Ok(())
    }

    /// Reads the manifest only, without decoding the index.
    pub fn read_manifest(store: &dyn IndexStore) -> Result<IndexManifest, IndexError> {
        let bytes = store
            .get(MANIFEST_BLOB)?
            .ok_or_else(|| IndexError::NotFound(store.location()))?;
        serde_json::from_slice(&bytes).map_err(|e| IndexError::Corrupt(format!("manifest: {e}")))
    }

    /// Loads a saved index and rebuilds its search structures.
    ///
    /// The metric and dimension come from the saved index; `cfg` supplies the
    /// ANN tuning.
    pub fn load(store: &dyn IndexStore, cfg: IndexConfig) -> Result<Self, IndexError> {
        let manifest = Self::read_manifest(store)?;
        if manifest.schema_version != INDEX_SCHEMA_VERSION {
            return Err(IndexError::Corrupt(format!(
                "schema version {} (expected {INDEX_SCHEMA_VERSION})",
                manifest.schema_version
            )));
        }

        let payload = store
            .get(INDEX_BLOB)?
            .ok_or_else(|| IndexError::NotFound(store.location()))?;
        let decompressed = decompress(manifest.compression, &payload)?;
        let (persisted, _): (PersistedIndex, usize) = decode_from_slice(&decompressed, standard())?;

        if persisted.schema_version != INDEX_SCHEMA_VERSION {
            return Err(IndexError::Corrupt(format!(
                "schema version {} (expected {INDEX_SCHEMA_VERSION})",
                persisted.schema_version
            )));
        }
        if persisted.documents.len() != persisted.vectors.len() {
            return Err(IndexError::Corrupt(format!(
                "{} documents but {} vectors",
                persisted.documents.len(),
                persisted.vectors.len()
            )));
        }

        if cfg.metric != persisted.metric {
            tracing::debug!(
                configured = cfg.metric.as_str(),
                stored = persisted.metric.as_str(),
                "using the metric the index was built with"
            );
        }

        let cfg = IndexConfig {
            metric: persisted.metric,
            compression: CompressionConfig {
                codec: manifest.compression,
                ..cfg.compression
            },
            ..cfg
        };
        let mut index = VectorIndex::new(persisted.dimension, cfg).with_model_name(persisted.model_name);
        for (document, vector) in persisted.documents.into_iter().zip(persisted.vectors) {
            index
                .add(document, vector)
                .map_err(|e| IndexError::Corrupt(e.to_string()))?;
        }
        index.build();
        Ok(index)
    }
}

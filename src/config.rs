//! YAML configuration for the indexer.
//!
//! Every field is optional; an empty file (or no file at all) builds the
//! default index from `iso17025.json` into `iso17025_index/`.
//!
//! ```yaml
//! version: "1.0"
//! corpus_paths: ["iso17025.json"]
//! batch_size: 16
//!
//! embedding:
//!   mode: "onnx"
//!   model_name: "all-MiniLM-L6-v2"
//!   model_path: "./models/all-MiniLM-L6-v2/onnx/model.onnx"
//!   tokenizer_path: "./models/all-MiniLM-L6-v2/tokenizer.json"
//!
//! index:
//!   metric: "l2"
//!   compression:
//!     codec: "zstd"
//!     level: 3
//!
//! store:
//!   kind: "directory"
//!   path: "iso17025_index"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use index::{IndexConfig, StoreConfig};
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub version: String,
    /// Candidate corpus files, first existing one wins.
    pub corpus_paths: Vec<PathBuf>,
    /// Texts per embedding call.
    pub batch_size: usize,
    pub embedding: SemanticConfig,
    pub index: IndexConfig,
    pub store: StoreConfig,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            corpus_paths: vec![PathBuf::from("iso17025.json")],
            batch_size: 16,
            embedding: SemanticConfig::default(),
            index: IndexConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl IndexerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        // serde_yaml reads an empty document as unit, not as an empty map
        let config: IndexerConfig = if yaml.trim().is_empty() {
            IndexerConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }

        if self.corpus_paths.is_empty() {
            return Err(ConfigLoadError::Validation(
                "corpus_paths must list at least one file".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigLoadError::Validation(
                "batch_size must be greater than 0".into(),
            ));
        }
        if self.embedding.embedding_dim == 0 {
            return Err(ConfigLoadError::Validation(
                "embedding.embedding_dim must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// `--corpus` replaces the candidate list.
    pub fn with_corpus(mut self, path: impl Into<PathBuf>) -> Self {
        self.corpus_paths = vec![path.into()];
        self
    }

    /// `--output` always means a directory store.
    pub fn with_output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store = StoreConfig::directory(dir);
        self
    }
}

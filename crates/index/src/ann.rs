//! Nearest-neighbour search over the stored vectors.
//!
//! Small collections (a standard's clauses number in the hundreds) are
//! searched exactly with a linear scan. Once the collection reaches
//! [`AnnConfig::min_vectors_for_ann`] an HNSW graph is built and used instead.
//!
//! ## Trade-offs
//!
//! - **Speed**: HNSW is sub-linear, linear scan is O(n)
//! - **Recall**: HNSW typically reaches 95-99%, linear scan is exact
//! - **Memory**: the graph is held in addition to the raw vectors
//!
//! Distances are always "lower is closer": Euclidean distance for
//! [`Metric::L2`], `1 - cosine similarity` for [`Metric::Cosine`].

use hnsw_rs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::IndexError;

/// Distance function used to rank neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Euclidean distance.
    #[default]
    L2,
    /// Cosine distance (`1 - cos`).
    Cosine,
}

impl Metric {
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Metric::L2 => l2_distance(a, b),
            Metric::Cosine => cosine_distance(a, b),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::L2 => "l2",
            Metric::Cosine => "cosine",
        }
    }
}

/// Configuration for ANN index construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnConfig {
    /// Number of neighbors per node (higher = better recall, slower build).
    /// Default: 16
    pub m: usize,
    /// Size of dynamic candidate list during construction.
    /// Default: 200
    pub ef_construction: usize,
    /// Size of dynamic candidate list during search.
    /// Default: 50
    pub ef_search: usize,
    /// Whether to use ANN or always scan.
    /// Default: true (use ANN when beneficial)
    pub enabled: bool,
    /// Minimum number of vectors before ANN is used.
    /// Below this threshold, linear scan is used even if enabled=true.
    /// Default: 1000
    pub min_vectors_for_ann: usize,
}

impl Default for AnnConfig {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 200,
            ef_search: 50,
            enabled: true,
            min_vectors_for_ann: 1000,
        }
    }
}

impl AnnConfig {
    pub fn with_m(mut self, m: usize) -> Self {
        self.m = m;
        self
    }

    pub fn with_ef_search(mut self, ef: usize) -> Self {
        self.ef_search = ef;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_min_vectors_for_ann(mut self, min: usize) -> Self {
        self.min_vectors_for_ann = min;
        self
    }

    /// Check if ANN should be used given the current dataset size.
    pub fn should_use_ann(&self, num_vectors: usize) -> bool {
        self.enabled && num_vectors >= self.min_vectors_for_ann
    }
}

/// One neighbour: position in insertion order plus its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnResult {
    pub index: usize,
    pub distance: f32,
}

enum HnswGraph {
    L2(Hnsw<'static, f32, DistL2>),
    Cosine(Hnsw<'static, f32, DistCosine>),
}

impl HnswGraph {
    fn search(&self, query: &[f32], k: usize, ef: usize) -> Vec<Neighbour> {
        match self {
            HnswGraph::L2(hnsw) => hnsw.search(query, k, ef),
            HnswGraph::Cosine(hnsw) => hnsw.search(query, k, ef),
        }
    }
}

/// Vector store with exact and HNSW search paths.
pub struct AnnIndex {
    config: AnnConfig,
    metric: Metric,
    dimension: usize,
    hnsw: Option<HnswGraph>,
    vectors: Vec<Vec<f32>>,
    built: bool,
}

impl AnnIndex {
    /// Create a new empty index.
    pub fn new(dimension: usize, metric: Metric, config: AnnConfig) -> Self {
        Self {
            config,
            metric,
            dimension,
            hnsw: None,
            vectors: Vec::new(),
            built: false,
        }
    }

    /// Append a vector. Its position is its identity.
    pub fn insert(&mut self, vector: Vec<f32>) -> Result<usize, IndexError> {
        self.check_dimension(&vector)?;
        let index = self.vectors.len();
        self.vectors.push(vector);
        self.built = false;
        Ok(index)
    }

    /// Up to `k` nearest neighbours, closest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<AnnResult>, IndexError> {
        self.check_dimension(query)?;
        if k == 0 || self.vectors.is_empty() {
            return Ok(Vec::new());
        }

        match &self.hnsw {
            Some(graph) if self.built && self.config.should_use_ann(self.vectors.len()) => {
                Ok(self.hnsw_search(graph, query, k))
            }
            _ => Ok(self.linear_search(query, k)),
        }
    }

    fn hnsw_search(&self, graph: &HnswGraph, query: &[f32], k: usize) -> Vec<AnnResult> {
        let ef = self.config.ef_search.max(k);
        let mut results: Vec<AnnResult> = graph
            .search(query, k, ef)
            .into_iter()
            .map(|neighbour| AnnResult {
                index: neighbour.get_origin_id(),
                distance: neighbour.distance,
            })
            .collect();
        sort_by_distance(&mut results);
        results.truncate(k);
        results
    }

    /// Linear search (exact).
    fn linear_search(&self, query: &[f32], k: usize) -> Vec<AnnResult> {
        let mut results: Vec<AnnResult> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(index, vec)| AnnResult {
                index,
                distance: self.metric.distance(query, vec),
            })
            .collect();
        sort_by_distance(&mut results);
        results.truncate(k);
        results
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                got: vector.len(),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Whether searches currently go through the HNSW graph.
    pub fn uses_ann(&self) -> bool {
        self.built && self.hnsw.is_some() && self.config.should_use_ann(self.vectors.len())
    }

    /// Builds the HNSW graph when the collection is large enough; otherwise
    /// marks the index ready for linear search.
    pub fn build(&mut self) {
        self.hnsw = None;
        let nb_elem = self.vectors.len();
        // HNSW needs a handful of points to form layers
        if nb_elem < 10 || !self.config.should_use_ann(nb_elem) {
            self.built = true;
            return;
        }

        let nb_layer = 16.min((nb_elem as f32).ln().trunc() as usize).max(1);
        let data_for_insertion: Vec<(&Vec<f32>, usize)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(idx, vec)| (vec, idx))
            .collect();

        let graph = match self.metric {
            Metric::L2 => {
                let hnsw = Hnsw::<f32, DistL2>::new(
                    self.config.m,
                    nb_elem,
                    nb_layer,
                    self.config.ef_construction,
                    DistL2 {},
                );
                hnsw.parallel_insert(&data_for_insertion);
                HnswGraph::L2(hnsw)
            }
            Metric::Cosine => {
                let hnsw = Hnsw::<f32, DistCosine>::new(
                    self.config.m,
                    nb_elem,
                    nb_layer,
                    self.config.ef_construction,
                    DistCosine {},
                );
                hnsw.parallel_insert(&data_for_insertion);
                HnswGraph::Cosine(hnsw)
            }
        };

        tracing::debug!(vectors = nb_elem, layers = nb_layer, "built hnsw graph");
        self.hnsw = Some(graph);
        self.built = true;
    }
}

fn sort_by_distance(results: &mut [AnnResult]) {
    results.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Calculate cosine distance (1 - cosine similarity).
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::stats::QueryStats;
use generation::{CompletionClient, OpenAiClient};
use index::VectorIndex;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared application state
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Vector index loaded at startup, read-only afterwards
    pub index: Arc<VectorIndex>,

    /// Completion client (OpenAI in production)
    pub llm: Arc<dyn CompletionClient>,

    /// Per-query statistics
    stats: Mutex<QueryStats>,

    /// Prometheus renderer, present when the recorder was installed
    pub metrics_handle: Option<PrometheusHandle>,
}

impl ServerState {
    /// Loads the index from the configured store and builds the OpenAI client.
    ///
    /// A missing or corrupt index is fatal: there is nothing to answer from.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = config.index_store.build()?;
        tracing::info!(location = %store.location(), "loading vector index");
        let index = VectorIndex::load(store.as_ref(), config.index.clone())?;

        if index.model_name() != config.embedding.model_name {
            tracing::warn!(
                index_model = index.model_name(),
                configured_model = %config.embedding.model_name,
                "embedding model differs from the one the index was built with"
            );
        }
        if index.is_empty() {
            tracing::warn!("vector index is empty, every answer will lack context");
        }

        let llm = OpenAiClient::new(config.llm.clone())?;
        Ok(Self::from_parts(config, index, Arc::new(llm)))
    }

    /// Assembles state from already-built parts (tests, embedding).
    pub fn from_parts(
        config: ServerConfig,
        index: VectorIndex,
        llm: Arc<dyn CompletionClient>,
    ) -> Self {
        let stats = QueryStats::new(config.max_recorded_queries);
        Self {
            config: Arc::new(config),
            index: Arc::new(index),
            llm,
            stats: Mutex::new(stats),
            metrics_handle: None,
        }
    }

    pub fn with_metrics_handle(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Locks the statistics. Never hold the guard across an `.await`.
    pub fn stats(&self) -> ServerResult<MutexGuard<'_, QueryStats>> {
        self.stats
            .lock()
            .map_err(|_| ServerError::Internal("query statistics lock poisoned".into()))
    }
}

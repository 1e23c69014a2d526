use generation::LlmConfig;
use index::{IndexConfig, StoreConfig};
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ServerError, ServerResult};

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds. Must cover the completion call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Enable permissive CORS (the client UI runs on another origin)
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log filter, `RUST_LOG` syntax
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Also append plain log lines to this file
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Prometheus endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// How many per-query records `/stats` keeps; counters are unaffected
    #[serde(default = "default_max_recorded_queries")]
    pub max_recorded_queries: usize,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Where the indexer saved the vector index
    #[serde(default)]
    pub index_store: StoreConfig,

    #[serde(default)]
    pub index: IndexConfig,

    /// Must match the configuration the index was built with
    #[serde(default)]
    pub embedding: SemanticConfig,

    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Passages retrieved per question
    pub top_k: usize,
    /// Characters of each passage echoed back in `context_used`
    pub snippet_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            snippet_chars: 250,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            log_file: None,
            metrics_enabled: default_true(),
            max_recorded_queries: default_max_recorded_queries(),
            retrieval: RetrievalConfig::default(),
            index_store: StoreConfig::default(),
            index: IndexConfig::default(),
            embedding: SemanticConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `server.{toml,yaml,json}`
    /// file and `NORMRAG_SERVER__*` environment variables.
    ///
    /// `OPENAI_API_KEY` fills `llm.api_key` when it is not set otherwise.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(
                config::Environment::with_prefix("NORMRAG_SERVER")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        let config = config.with_api_key_fallback(std::env::var("OPENAI_API_KEY").ok());
        config.validate()?;
        Ok(config)
    }

    fn with_api_key_fallback(mut self, env_key: Option<String>) -> Self {
        if self.llm.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            self.llm.api_key = env_key;
        }
        self
    }

    /// Rejects configurations the service cannot start with.
    pub fn validate(&self) -> ServerResult<()> {
        if self.llm.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err(ServerError::Config(
                "OPENAI_API_KEY is not set (or llm.api_key in the server config)".into(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ServerError::Config("retrieval.top_k must be at least 1".into()));
        }
        self.socket_addr()?;
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> ServerResult<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_timeout_secs() -> u64 {
    90
}

fn default_max_recorded_queries() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

//! normrag Server - HTTP query service for ISO/IEC 17025:2017 consulting
//!
//! Answers free-text questions about the standard with retrieval-augmented
//! generation: the question is embedded, the closest clauses are pulled from
//! the vector index built by `normrag-index`, and a chat model answers from
//! those clauses only.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `POST /ask` - Answer a question (`{"question": "..."}`)
//! - `GET /` - Service description
//! - `GET /health` - Health and index metadata
//! - `GET /stats` - Query statistics
//! - `GET /export-metrics` - Statistics as a report document
//! - `GET /metrics` - Prometheus metrics

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod stats;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;

//! Answer generation for normrag.
//!
//! [`compose_prompt`] wraps the retrieved clauses and the question in the
//! fixed consulting template; a [`CompletionClient`] turns that prompt into
//! an answer. [`OpenAiClient`] talks to any OpenAI-compatible
//! `/chat/completions` endpoint.

mod client;
mod error;
mod prompt;

pub use client::{CompletionClient, LlmConfig, OpenAiClient};
pub use error::GenerationError;
pub use prompt::{compose_prompt, CONTEXT_SEPARATOR};

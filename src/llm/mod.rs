//! LLM integration for AI Advisor.
//!
//! A single completion backend: Google's Gemini `generateContent` endpoint,
//! reached over plain HTTP with `reqwest`. Callers talk to it through the
//! `LlmProvider` trait so the workflow can be driven by a stub in tests.

pub mod gemini;
pub mod provider;

pub use gemini::GeminiClient;
pub use provider::*;

use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::LlmError;

/// Create the completion provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let client = GeminiClient::new(config)?;
    tracing::info!("Using Gemini (model: {})", config.model);
    Ok(Arc::new(client))
}

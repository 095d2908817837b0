//! Error types for AI Advisor.

use crate::advisor::state::{StageEvent, WorkflowStage};

/// Top-level error type for the advisor.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Completion client errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} returned HTTP {status}: {body}")]
    HttpStatus {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Stage machine errors.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Stage {from} has no transition for event {event:?}")]
    InvalidTransition {
        from: WorkflowStage,
        event: StageEvent,
    },
}

/// Result type alias for the advisor.
pub type Result<T> = std::result::Result<T, Error>;

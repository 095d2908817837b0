//! AI Advisor: conversational financial profiling and recommendations.

pub mod advisor;
pub mod config;
pub mod error;
pub mod llm;

pub use error::{Error, Result};

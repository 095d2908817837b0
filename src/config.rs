//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default Gemini endpoint base.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model id.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Completion client configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: SecretString,
    pub model: String,
    pub api_base: String,
    /// Per-request timeout for the upstream call.
    pub request_timeout: Duration,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }

    /// Full `generateContent` URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

/// Thresholds that drive the stage coordinator.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// User turns before the completeness classifier is consulted.
    pub heuristic_turn_threshold: u32,
    /// User turns after which the conversation counts as complete regardless.
    pub hard_turn_ceiling: u32,
    /// Transcript length below which the classifier is never called.
    pub min_transcript_turns: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            heuristic_turn_threshold: 4,
            hard_turn_ceiling: 8,
            min_transcript_turns: 4,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory holding `index.html`.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            static_dir: PathBuf::from("./static"),
        }
    }
}

/// Everything the binary needs, resolved from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub workflow: WorkflowConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Read configuration from environment variables.
    ///
    /// `GEMINI_API_KEY` is required; everything else falls back to a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let mut llm = LlmConfig::new(api_key);
        if let Ok(model) = std::env::var("ADVISOR_MODEL") {
            llm.model = model;
        }
        if let Ok(base) = std::env::var("ADVISOR_API_BASE") {
            llm.api_base = base;
        }
        if let Ok(raw) = std::env::var("ADVISOR_REQUEST_TIMEOUT_SECS") {
            llm.request_timeout = Duration::from_secs(parse_var("ADVISOR_REQUEST_TIMEOUT_SECS", &raw)?);
        }

        let mut server = ServerConfig::default();
        if let Ok(raw) = std::env::var("ADVISOR_PORT") {
            server.port = parse_var("ADVISOR_PORT", &raw)?;
        }
        if let Ok(dir) = std::env::var("ADVISOR_STATIC_DIR") {
            server.static_dir = PathBuf::from(dir);
        }

        Ok(Self {
            llm,
            workflow: WorkflowConfig::default(),
            server,
        })
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

//! HTTP completion client for the Gemini `generateContent` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::LlmError;

use super::provider::{CompletionRequest, GenerateResponse, LlmProvider};

const PROVIDER: &str = "gemini";

/// Sends one POST per completion with a fixed request timeout.
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    api_key: SecretString,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            endpoint: config.endpoint(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<GenerateResponse, LlmError> {
        debug!(model = %self.model, turns = request.turns.len(), "Sending completion request");

        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request.to_body())
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: format!("Failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            // A JSON error body decodes to a response without candidates,
            // which callers already treat as an unusable reply.
            return match serde_json::from_slice::<GenerateResponse>(&bytes) {
                Ok(decoded) => {
                    warn!(status = status.as_u16(), "Upstream returned an error body");
                    Ok(decoded)
                }
                Err(_) => Err(LlmError::HttpStatus {
                    provider: PROVIDER.to_string(),
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                }),
            };
        }

        serde_json::from_slice(&bytes).map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_uses_configured_model() {
        let client = GeminiClient::new(&LlmConfig::new("test-key")).unwrap();
        assert_eq!(client.model_name(), "gemini-2.5-flash");
        assert!(client.endpoint.ends_with("/models/gemini-2.5-flash:generateContent"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_request_failed() {
        let config = LlmConfig {
            api_base: "http://127.0.0.1:1".to_string(),
            request_timeout: std::time::Duration::from_secs(2),
            ..LlmConfig::new("test-key")
        };
        let client = GeminiClient::new(&config).unwrap();
        let err = client
            .complete(CompletionRequest::user_prompt("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::RequestFailed { .. }), "got {err:?}");
    }
}

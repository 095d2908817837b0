//! Recommendation generator: turns an extracted profile into advice text.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::llm::{CompletionRequest, LlmProvider};

use super::profile::Profile;
use super::prompts::{RECOMMENDATION_APOLOGY, recommendation_prompt};

/// Outcome of one recommendation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub text: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecommendationResult {
    fn failed(reason: String) -> Self {
        Self {
            text: RECOMMENDATION_APOLOGY.to_string(),
            generated_at: Utc::now(),
            error: Some(reason),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

pub struct RecommendationGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl RecommendationGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Generate recommendations. Never fails; errors are carried in the result.
    pub async fn recommend(&self, profile: &Profile) -> RecommendationResult {
        let profile_json = match serde_json::to_string_pretty(profile) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Failed to serialize profile");
                return RecommendationResult::failed(e.to_string());
            }
        };
        debug!(profile = %profile_json, "Generating recommendations");

        match self
            .llm
            .complete(CompletionRequest::user_prompt(recommendation_prompt(&profile_json)))
            .await
        {
            Ok(response) => {
                let text = response.text().unwrap_or_default().to_string();
                info!(len = text.len(), "Recommendations generated");
                RecommendationResult {
                    text,
                    generated_at: Utc::now(),
                    error: None,
                }
            }
            Err(e) => {
                error!(error = %e, "Error generating recommendations");
                RecommendationResult::failed(e.to_string())
            }
        }
    }
}

//! Profile extractor. Replays the transcript through the model to fill the
//! profile schema.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::llm::{CompletionRequest, LlmProvider, Turn};

use super::profile::Profile;
use super::prompts::{extraction_prompt, render_transcript, strip_code_fence};

pub struct ProfileExtractor {
    llm: Arc<dyn LlmProvider>,
}

impl ProfileExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Extract a profile from the transcript.
    ///
    /// Total: a failed call or an unparseable reply yields the all-null profile.
    pub async fn extract(&self, transcript: &[Turn]) -> Profile {
        let prompt = extraction_prompt(&Profile::schema_json(), &render_transcript(transcript));

        let response = match self.llm.complete(CompletionRequest::user_prompt(prompt)).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Profile extraction call failed");
                return Profile::default();
            }
        };

        let Some(text) = response.text() else {
            warn!(reply = ?response.reply(), "Profile extraction returned no text");
            return Profile::default();
        };

        parse_profile(text)
    }
}

/// Parse a model reply into a profile, falling back to the all-null schema.
///
/// Only a JSON object is accepted. Inside it, a malformed section or list is
/// reset on its own and the rest of the reply is kept.
pub fn parse_profile(reply: &str) -> Profile {
    let value = match serde_json::from_str::<Value>(strip_code_fence(reply)) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => {
            warn!(kind = json_kind(&other), "Profile reply is not a JSON object");
            return Profile::default();
        }
        Err(e) => {
            warn!(error = %e, raw = %reply, "Failed to parse profile JSON");
            return Profile::default();
        }
    };

    match serde_json::from_value::<Profile>(value) {
        Ok(profile) => {
            if profile.has_minimum_info() {
                info!("Profile extracted");
            } else {
                warn!("Extracted profile has no income, expense or goal data");
            }
            profile
        }
        Err(e) => {
            warn!(error = %e, "Profile JSON did not fit the schema");
            Profile::default()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

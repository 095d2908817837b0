//! Completion provider trait and the `generateContent` wire shapes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Sender of a turn, as the upstream model names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Model => write!(f, "model"),
        }
    }
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// A single text part of a content block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A role-tagged content block (request or response side).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Convert a response block into a transcript turn; a missing role means model.
    pub fn into_turn(self) -> Turn {
        let text = self
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");
        Turn {
            role: self.role.unwrap_or(Role::Model),
            text,
        }
    }
}

impl From<&Turn> for Content {
    fn from(turn: &Turn) -> Self {
        Self {
            role: Some(turn.role),
            parts: vec![Part {
                text: Some(turn.text.clone()),
            }],
        }
    }
}

/// A request to the completion endpoint.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub turns: Vec<Turn>,
}

impl CompletionRequest {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    /// Single user-turn request, used by the extraction, recommendation and
    /// classification prompts.
    pub fn user_prompt(prompt: impl Into<String>) -> Self {
        Self::new(vec![Turn::user(prompt)])
    }

    /// Request body in `generateContent` form.
    pub fn to_body(&self) -> serde_json::Value {
        let contents: Vec<Content> = self.turns.iter().map(Content::from).collect();
        serde_json::json!({ "contents": contents })
    }
}

/// One candidate of a completion response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
}

/// Decoded completion response. Missing candidates or content is a valid shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// What a response actually carries, for exhaustive matching by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply<'a> {
    /// Text of the first part of the first candidate.
    Text(&'a str),
    NoCandidates,
    NoContent,
    /// Content present but without parts.
    NoParts,
    /// First part carries no text.
    NoText,
}

impl GenerateResponse {
    pub fn reply(&self) -> Reply<'_> {
        let Some(candidate) = self.candidates.first() else {
            return Reply::NoCandidates;
        };
        let Some(content) = candidate.content.as_ref() else {
            return Reply::NoContent;
        };
        let Some(part) = content.parts.first() else {
            return Reply::NoParts;
        };
        match part.text.as_deref() {
            Some(text) => Reply::Text(text),
            None => Reply::NoText,
        }
    }

    /// Text of the first candidate, if there is any.
    pub fn text(&self) -> Option<&str> {
        match self.reply() {
            Reply::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Content block of the first candidate, if present.
    pub fn first_content(&self) -> Option<&Content> {
        self.candidates.first().and_then(|c| c.content.as_ref())
    }

    /// Convenience constructor for a single-candidate text reply.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some(Role::Model),
                    parts: vec![Part {
                        text: Some(text.into()),
                    }],
                }),
            }],
        }
    }
}

/// A remote text-generation endpoint.
///
/// Implementations send the turns as-is and return the decoded body without
/// interpreting it. Transport failures surface as `Err`; there is no retry.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<GenerateResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_generate_content_shape() {
        let request = CompletionRequest::new(vec![Turn::model("persona"), Turn::user("hi")]);
        let body = request.to_body();
        assert_eq!(body["contents"][0]["role"], "model");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "persona");
        assert_eq!(body["contents"][1]["role"], "user");
        assert_eq!(body["contents"][1]["parts"][0]["text"], "hi");
    }

    #[test]
    fn reply_text() {
        let response = GenerateResponse::from_text("hello");
        assert_eq!(response.reply(), Reply::Text("hello"));
        assert_eq!(response.text(), Some("hello"));
    }

    #[test]
    fn reply_missing_pieces_are_not_errors() {
        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.reply(), Reply::NoCandidates);

        let no_content: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert_eq!(no_content.reply(), Reply::NoContent);

        let no_parts: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"role":"model"}}]}"#).unwrap();
        assert_eq!(no_parts.reply(), Reply::NoParts);

        let no_text: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{}]}}]}"#).unwrap();
        assert_eq!(no_text.reply(), Reply::NoText);
        assert!(no_text.text().is_none());
    }

    #[test]
    fn content_without_role_becomes_model_turn() {
        let content: Content =
            serde_json::from_str(r#"{"parts":[{"text":"a"},{"text":"b"}]}"#).unwrap();
        let turn = content.into_turn();
        assert_eq!(turn.role, Role::Model);
        assert_eq!(turn.text, "ab");
    }

    #[test]
    fn role_display_matches_serde() {
        for role in [Role::User, Role::Model] {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(format!("\"{role}\""), json);
        }
    }
}

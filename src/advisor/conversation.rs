//! Conversation engine: owns the transcript and runs one chat round per call.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::llm::{CompletionRequest, LlmProvider, Reply, Role, Turn};

use super::prompts::{COMPLETION_MARKER, EMPTY_REPLY, PERSONA_PROMPT, UNPROCESSABLE_REPLY};

/// Owns the linear chat transcript of the live session.
pub struct ConversationEngine {
    llm: Arc<dyn LlmProvider>,
    transcript: Vec<Turn>,
}

impl ConversationEngine {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// Append a turn produced outside a chat round (e.g. recommendations).
    pub fn push(&mut self, turn: Turn) {
        self.transcript.push(turn);
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Whether a reply carries the completion marker.
    pub fn signals_completion(reply: &str) -> bool {
        reply.contains(COMPLETION_MARKER)
    }

    /// Build the turns to send upstream for this round.
    ///
    /// A trailing model turn is the reply already delivered and is dropped.
    /// `user_text` is added to the copy only; it is persisted after a
    /// successful round.
    pub fn build_request(&self, user_text: Option<&str>) -> Vec<Turn> {
        let mut turns = self.transcript.clone();
        if turns.last().is_some_and(|t| t.role == Role::Model) {
            turns.pop();
        }
        if let Some(text) = user_text {
            turns.push(Turn::user(text));
        }
        if let Some(text) = user_text {
            if turns.last().is_none_or(|t| t.role != Role::User) {
                turns.push(Turn::user(text));
            }
        }
        turns
    }

    /// Run one round and return the text chunks to show the user.
    ///
    /// Always returns exactly one chunk; upstream failures and odd reply
    /// shapes become display text instead of errors.
    pub async fn handle_turn(&mut self, user_text: Option<&str>) -> Vec<String> {
        let turns = if self.transcript.is_empty() {
            info!("Starting new session with persona instruction");
            let persona = Turn::model(PERSONA_PROMPT);
            self.transcript.push(persona.clone());
            vec![persona]
        } else {
            self.build_request(user_text)
        };

        debug!(turns = turns.len(), "Sending conversation turns");

        let reply = match self.llm.complete(CompletionRequest::new(turns)).await {
            Ok(response) => {
                if !response.candidates.is_empty() {
                    if let Some(text) = user_text {
                        self.transcript.push(Turn::user(text));
                    }
                    if let Some(content) = response.first_content() {
                        self.transcript.push(content.clone().into_turn());
                    }
                }
                match response.reply() {
                    Reply::Text(text) => text.to_string(),
                    Reply::NoText => EMPTY_REPLY.to_string(),
                    Reply::NoCandidates | Reply::NoContent | Reply::NoParts => {
                        warn!(reply = ?response.reply(), "Unexpected completion shape");
                        UNPROCESSABLE_REPLY.to_string()
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Conversation completion failed");
                format!("Error: {e}")
            }
        };

        debug!(len = reply.len(), "Conversation reply ready");
        vec![reply]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::testing::StubLlm;
    use crate::llm::GenerateResponse;

    fn engine_with(transcript: Vec<Turn>, llm: Arc<StubLlm>) -> ConversationEngine {
        let mut engine = ConversationEngine::new(llm);
        for turn in transcript {
            engine.push(turn);
        }
        engine
    }

    #[test]
    fn build_request_drops_one_trailing_model_turn() {
        let engine = engine_with(
            vec![Turn::model("persona"), Turn::model("greeting")],
            StubLlm::new(),
        );
        let turns = engine.build_request(Some("hi"));
        assert_eq!(turns, vec![Turn::model("persona"), Turn::user("hi")]);
    }

    #[test]
    fn build_request_keeps_trailing_user_turn() {
        let engine = engine_with(vec![Turn::model("persona"), Turn::user("earlier")], StubLlm::new());
        let turns = engine.build_request(Some("now"));
        assert_eq!(
            turns,
            vec![Turn::model("persona"), Turn::user("earlier"), Turn::user("now")]
        );
    }

    #[test]
    fn build_request_always_ends_in_user_with_text() {
        let transcripts = vec![
            vec![],
            vec![Turn::model("a")],
            vec![Turn::model("a"), Turn::user("b"), Turn::model("c")],
        ];
        for transcript in transcripts {
            let engine = engine_with(transcript, StubLlm::new());
            let turns = engine.build_request(Some("question"));
            assert_eq!(turns.last(), Some(&Turn::user("question")));
        }
    }

    #[test]
    fn build_request_without_text_does_not_invent_user_turn() {
        let engine = engine_with(vec![Turn::model("persona"), Turn::model("greeting")], StubLlm::new());
        assert_eq!(engine.build_request(None), vec![Turn::model("persona")]);
    }

    #[tokio::test]
    async fn first_call_sends_only_persona() {
        let llm = StubLlm::with_replies(vec![Ok(GenerateResponse::from_text("Hi there!"))]);
        let mut engine = ConversationEngine::new(llm.clone());

        let chunks = engine.handle_turn(Some("ignored for the request")).await;

        let sent = llm.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], vec![Turn::model(PERSONA_PROMPT)]);
        assert_eq!(chunks, vec!["Hi there!"]);
        assert_eq!(engine.transcript()[0], Turn::model(PERSONA_PROMPT));
    }

    #[tokio::test]
    async fn first_call_without_text_persists_persona_and_reply() {
        let llm = StubLlm::with_replies(vec![Ok(GenerateResponse::from_text("Welcome"))]);
        let mut engine = ConversationEngine::new(llm);
        engine.handle_turn(None).await;
        assert_eq!(
            engine.transcript(),
            &[Turn::model(PERSONA_PROMPT), Turn::model("Welcome")]
        );
    }

    #[tokio::test]
    async fn successful_round_persists_user_and_model() {
        let llm = StubLlm::with_replies(vec![Ok(GenerateResponse::from_text("Noted."))]);
        let mut engine = engine_with(vec![Turn::model("persona"), Turn::model("greeting")], llm.clone());

        engine.handle_turn(Some("I earn 5k a month")).await;

        assert_eq!(
            llm.requests()[0],
            vec![Turn::model("persona"), Turn::user("I earn 5k a month")]
        );
        assert_eq!(
            &engine.transcript()[2..],
            &[Turn::user("I earn 5k a month"), Turn::model("Noted.")]
        );
    }

    #[tokio::test]
    async fn no_candidates_yields_apology_and_persists_nothing() {
        let llm = StubLlm::with_replies(vec![Ok(GenerateResponse::default())]);
        let mut engine = engine_with(vec![Turn::model("persona")], llm);

        let chunks = engine.handle_turn(Some("hello")).await;

        assert_eq!(chunks, vec![UNPROCESSABLE_REPLY]);
        assert_eq!(engine.transcript().len(), 1);
    }

    #[tokio::test]
    async fn missing_text_part_yields_empty_reply_notice() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"role":"model","parts":[{}]}}]}"#)
                .unwrap();
        let llm = StubLlm::with_replies(vec![Ok(response)]);
        let mut engine = engine_with(vec![Turn::model("persona")], llm);

        let chunks = engine.handle_turn(Some("hello")).await;
        assert_eq!(chunks, vec![EMPTY_REPLY]);
        assert_eq!(engine.transcript().len(), 3);
    }

    #[tokio::test]
    async fn transport_failure_becomes_error_text() {
        let llm = StubLlm::failing();
        let mut engine = engine_with(vec![Turn::model("persona")], llm);

        let chunks = engine.handle_turn(Some("hello")).await;

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].starts_with("Error: "));
        assert_eq!(engine.transcript().len(), 1);
    }

    #[test]
    fn marker_detection() {
        assert!(ConversationEngine::signals_completion(
            "Thanks!\nPROFILE_COMPLETE_SIGNAL"
        ));
        assert!(!ConversationEngine::signals_completion("thanks"));
    }
}

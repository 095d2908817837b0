//! Stage coordinator. Routes each turn through the workflow and writes the
//! resulting chunks, in order, to one output channel.
//!
//! The coordinator owns the single live session. A turn holds the session
//! lock from start to finish, so a conversation round, profile extraction and
//! recommendation generation triggered by the same turn all land in the same
//! response stream with nothing interleaved. Concurrent requests are served
//! one after another against the same session; there is no session key.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::WorkflowConfig;
use crate::llm::{CompletionRequest, LlmProvider, Turn};

use super::conversation::ConversationEngine;
use super::extractor::ProfileExtractor;
use super::profile::Profile;
use super::prompts::{
    ANALYSIS_COMPLETE_NOTICE, EXTRACTING_NOTICE, EXTRACTION_CONFIRMATION, NO_PROFILE_APOLOGY,
    RECOMMENDATION_APOLOGY, RECOMMENDATION_BANNER, TRANSITION_NOTICE, completeness_prompt,
    format_recommendations, is_complete_verdict, render_transcript,
};
use super::recommender::{RecommendationGenerator, RecommendationResult};
use super::state::{CoordinatorState, StageEvent, WorkflowStage, WorkflowStatus};

/// Chunks buffered between the coordinator task and the HTTP body.
const OUTPUT_BUFFER: usize = 32;

/// Error recorded when the model answers the recommendation prompt with nothing.
const BLANK_RECOMMENDATION: &str = "model returned no recommendation text";

/// Transcript and workflow state of the live session.
pub struct Session {
    pub engine: ConversationEngine,
    pub state: CoordinatorState,
}

/// Ordered sink for the chunks of one turn.
struct Output {
    tx: mpsc::Sender<String>,
}

impl Output {
    /// Send a chunk. A disconnected client does not stop the turn.
    async fn emit(&self, chunk: String) {
        if self.tx.send(chunk).await.is_err() {
            debug!("Client went away; finishing turn without output");
        }
    }

    async fn notice(&self, text: &str) {
        self.emit(text.to_string()).await;
    }
}

pub struct Coordinator {
    llm: Arc<dyn LlmProvider>,
    extractor: ProfileExtractor,
    recommender: RecommendationGenerator,
    config: WorkflowConfig,
    session: Mutex<Session>,
}

impl Coordinator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: WorkflowConfig) -> Self {
        Self {
            extractor: ProfileExtractor::new(Arc::clone(&llm)),
            recommender: RecommendationGenerator::new(Arc::clone(&llm)),
            session: Mutex::new(Session {
                engine: ConversationEngine::new(Arc::clone(&llm)),
                state: CoordinatorState::default(),
            }),
            llm,
            config,
        }
    }

    /// Process one turn in the background and return its output chunks.
    ///
    /// The stream ends when the turn (including any extraction and
    /// recommendation it triggers) has finished.
    pub fn process_turn(self: &Arc<Self>, user_text: Option<String>) -> ReceiverStream<String> {
        let (tx, rx) = mpsc::channel(OUTPUT_BUFFER);
        let coordinator = Arc::clone(self);
        let span = info_span!("turn", turn_id = %Uuid::new_v4());
        tokio::spawn(
            async move {
                coordinator.run_turn(user_text.as_deref(), &Output { tx }).await;
            }
            .instrument(span),
        );
        ReceiverStream::new(rx)
    }

    async fn run_turn(&self, user_text: Option<&str>, out: &Output) {
        let mut session = self.session.lock().await;
        let Session { engine, state } = &mut *session;
        info!(stage = %state.stage, has_message = user_text.is_some(), "Processing turn");

        match state.stage {
            WorkflowStage::Conversation => {
                self.conversation_stage(engine, state, user_text, out).await;
            }
            WorkflowStage::ProfileExtraction => {
                self.extract_and_recommend(engine, state, out).await;
            }
            WorkflowStage::Recommendation => {
                self.recommendation_stage(engine, state, out).await;
            }
            WorkflowStage::Complete => {
                debug!("Follow-up question");
                for chunk in engine.handle_turn(user_text).await {
                    out.emit(chunk).await;
                }
            }
        }

        info!(
            stage = %state.stage,
            terminal = state.stage.is_terminal(),
            turns = state.turn_count,
            "Turn finished"
        );
    }

    async fn conversation_stage(
        &self,
        engine: &mut ConversationEngine,
        state: &mut CoordinatorState,
        user_text: Option<&str>,
        out: &Output,
    ) {
        for chunk in engine.handle_turn(user_text).await {
            if state.stage == WorkflowStage::Conversation
                && ConversationEngine::signals_completion(&chunk)
            {
                info!("Completion marker detected");
                advance(state, StageEvent::SignalDetected);
                out.notice(TRANSITION_NOTICE).await;
                self.extract_and_recommend(engine, state, out).await;
            }
            out.emit(chunk).await;
        }

        if user_text.is_some() {
            state.turn_count += 1;
            debug!(turns = state.turn_count, "Conversation turn counted");
        }

        // The marker path has already left Conversation; never extract twice.
        if state.stage != WorkflowStage::Conversation
            || state.turn_count < self.config.heuristic_turn_threshold
        {
            return;
        }

        advance(state, StageEvent::TurnThresholdReached);
        if self.is_profile_complete(engine.transcript(), state.turn_count).await {
            info!("Sufficient information gathered");
            advance(state, StageEvent::HeuristicComplete);
            out.notice(ANALYSIS_COMPLETE_NOTICE).await;
            out.notice(EXTRACTING_NOTICE).await;
            self.extract_and_recommend(engine, state, out).await;
        } else {
            advance(state, StageEvent::HeuristicIncomplete);
        }
    }

    /// ProfileExtraction → Recommendation → Complete, inline.
    async fn extract_and_recommend(
        &self,
        engine: &mut ConversationEngine,
        state: &mut CoordinatorState,
        out: &Output,
    ) {
        let profile = self.extractor.extract(engine.transcript()).await;
        state.profile = Some(profile);
        state.profile_extracted_at = Some(Utc::now());
        out.notice(EXTRACTION_CONFIRMATION).await;

        advance(state, StageEvent::ExtractionDone);
        out.notice(RECOMMENDATION_BANNER).await;
        self.recommendation_stage(engine, state, out).await;
    }

    async fn recommendation_stage(
        &self,
        engine: &mut ConversationEngine,
        state: &mut CoordinatorState,
        out: &Output,
    ) {
        let Some(profile) = state.profile.as_ref() else {
            warn!("No profile; cannot generate recommendations");
            advance(state, StageEvent::RecommendationFailed);
            out.notice(NO_PROFILE_APOLOGY).await;
            return;
        };

        let mut result = self.recommender.recommend(profile).await;
        state.recommendations_generated_at = Some(result.generated_at);
        if !result.is_failure() && result.text.trim().is_empty() {
            result.error = Some(BLANK_RECOMMENDATION.to_string());
        }

        if result.is_failure() {
            warn!(error = ?result.error, "Recommendation stage failed");
            advance(state, StageEvent::RecommendationFailed);
            state.recommendation = Some(result);
            out.notice(RECOMMENDATION_APOLOGY).await;
            return;
        }

        let message = format_recommendations(&result.text);
        engine.push(Turn::model(message.clone()));
        state.recommendation = Some(result);
        advance(state, StageEvent::RecommendationDone);
        info!("Streaming recommendations");
        out.emit(message).await;
    }

    /// Ask the model whether the conversation is informationally complete.
    ///
    /// Past the hard ceiling the answer is yes regardless of the classifier.
    async fn is_profile_complete(&self, transcript: &[Turn], turn_count: u32) -> bool {
        let verdict = if transcript.len() < self.config.min_transcript_turns {
            false
        } else {
            let prompt = completeness_prompt(&render_transcript(transcript));
            match self.llm.complete(CompletionRequest::user_prompt(prompt)).await {
                Ok(response) => response.text().is_some_and(is_complete_verdict),
                Err(e) => {
                    warn!(error = %e, "Completeness check failed");
                    false
                }
            }
        };
        let ceiling = turn_count >= self.config.hard_turn_ceiling;
        info!(verdict, ceiling, "Profile completeness check");
        verdict || ceiling
    }

    /// Return to the initial stage with an empty transcript.
    ///
    /// Waits for an in-flight turn to finish first.
    pub async fn reset(&self) {
        let mut session = self.session.lock().await;
        session.engine.clear();
        session.state = CoordinatorState::default();
        info!("Workflow reset");
    }

    pub async fn status(&self) -> WorkflowStatus {
        self.session.lock().await.state.status()
    }

    pub async fn stage(&self) -> WorkflowStage {
        self.session.lock().await.state.stage
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.session.lock().await.state.profile.clone()
    }

    pub async fn recommendation(&self) -> Option<RecommendationResult> {
        self.session.lock().await.state.recommendation.clone()
    }

    pub async fn transcript(&self) -> Vec<Turn> {
        self.session.lock().await.engine.transcript().to_vec()
    }
}

fn advance(state: &mut CoordinatorState, event: StageEvent) {
    let from = state.stage;
    match state.apply(event) {
        Ok(to) if to != from => info!(%from, %to, ?event, "Stage transition"),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Ignoring stage event"),
    }
}

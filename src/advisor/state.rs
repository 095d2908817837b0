//! Workflow state machine: which stage the guided session is in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

use super::profile::Profile;
use super::recommender::RecommendationResult;

/// The stages of the guided workflow.
///
/// Progresses Conversation → ProfileExtraction → Recommendation → Complete.
/// The two middle stages are normally entered and left inside one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    #[default]
    Conversation,
    ProfileExtraction,
    Recommendation,
    Complete,
}

/// Events that drive stage transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    /// The model emitted the completion marker.
    SignalDetected,
    /// Enough user turns for the completeness classifier to be consulted.
    TurnThresholdReached,
    HeuristicComplete,
    HeuristicIncomplete,
    ExtractionDone,
    RecommendationDone,
    RecommendationFailed,
}

impl WorkflowStage {
    /// Transition table: stage × event → next stage.
    pub fn on(self, event: StageEvent) -> Result<WorkflowStage, WorkflowError> {
        use StageEvent::*;
        use WorkflowStage::*;
        match (self, event) {
            (Conversation, SignalDetected) | (Conversation, HeuristicComplete) => {
                Ok(ProfileExtraction)
            }
            (Conversation, TurnThresholdReached) | (Conversation, HeuristicIncomplete) => {
                Ok(Conversation)
            }
            (ProfileExtraction, ExtractionDone) => Ok(Recommendation),
            (Recommendation, RecommendationDone) | (Recommendation, RecommendationFailed) => {
                Ok(Complete)
            }
            (from, event) => Err(WorkflowError::InvalidTransition { from, event }),
        }
    }

    /// Whether the guided flow is over (follow-up chat only).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Progress line shown to clients while a stage is running.
    pub fn status_message(&self) -> &'static str {
        match self {
            Self::ProfileExtraction => "🔄 Analyzing your financial profile...",
            Self::Recommendation => "💡 Generating personalized investment recommendations...",
            Self::Conversation | Self::Complete => "Processing...",
        }
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Conversation => "conversation",
            Self::ProfileExtraction => "profile_extraction",
            Self::Recommendation => "recommendation",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// Coordinator state for the single live session.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorState {
    pub stage: WorkflowStage,
    /// User turns handled in the Conversation stage.
    pub turn_count: u32,
    pub profile: Option<Profile>,
    pub recommendation: Option<RecommendationResult>,
    pub profile_extracted_at: Option<DateTime<Utc>>,
    pub recommendations_generated_at: Option<DateTime<Utc>>,
}

impl CoordinatorState {
    /// Apply an event. An event the table rejects leaves the stage untouched.
    pub fn apply(&mut self, event: StageEvent) -> Result<WorkflowStage, WorkflowError> {
        let next = self.stage.on(event)?;
        self.stage = next;
        Ok(next)
    }

    pub fn status(&self) -> WorkflowStatus {
        WorkflowStatus {
            current_stage: self.stage,
            status_message: self.stage.status_message().to_string(),
            profile_extracted: self.profile.is_some(),
            recommendations_ready: self.recommendation.is_some(),
            conversation_turns: self.turn_count,
            profile_extracted_at: self.profile_extracted_at,
            recommendations_generated_at: self.recommendations_generated_at,
        }
    }
}

/// Workflow status returned by the REST endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowStatus {
    pub current_stage: WorkflowStage,
    pub status_message: String,
    pub profile_extracted: bool,
    pub recommendations_ready: bool,
    pub conversation_turns: u32,
    pub profile_extracted_at: Option<DateTime<Utc>>,
    pub recommendations_generated_at: Option<DateTime<Utc>>,
}

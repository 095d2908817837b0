//! Advisor workflow: conversational profiling followed by recommendations.
//!
//! A session moves through four stages. The conversation engine chats with
//! the user until the persona emits its completion marker or the completeness
//! heuristic fires; the extractor then turns the transcript into a structured
//! `Profile`, and the recommender turns that profile into advice. After that
//! the session stays in follow-up mode. The `Coordinator` owns the single
//! live session and streams every turn's output as event-stream frames.

pub mod conversation;
pub mod coordinator;
pub mod extractor;
pub mod profile;
pub mod prompts;
pub mod recommender;
pub mod routes;
pub mod state;

pub use conversation::ConversationEngine;
pub use coordinator::Coordinator;
pub use extractor::ProfileExtractor;
pub use profile::Profile;
pub use recommender::{RecommendationGenerator, RecommendationResult};
pub use routes::{AdvisorRouteState, advisor_routes, app};
pub use state::{CoordinatorState, StageEvent, WorkflowStage, WorkflowStatus};

//! Graph stages
//!
//! Each stage reads the current state and returns a partial update. Stages
//! never mutate state directly; the graph applies their updates through the
//! reducer and records one execution per invocation.

mod conversation;
mod delivery;
mod error_recovery;
mod extraction;
mod parallel;
mod qualification;
mod ui_interaction;

pub use conversation::ConversationStage;
pub use delivery::{NotificationStage, NurtureStage};
pub use error_recovery::{ErrorRecoveryStage, RECOVERY_MESSAGE};
pub use extraction::ExtractionStage;
pub use parallel::ParallelProcessingStage;
pub use qualification::QualificationStage;
pub use ui_interaction::UiInteractionStage;

use async_trait::async_trait;
use lead_agent_core::{ConversationState, StageId, StateUpdate};

use crate::OrchestratorError;

/// What a stage hands back to the graph
#[derive(Debug, Default)]
pub struct StageOutput {
    pub update: StateUpdate,
    /// Summary stored on the execution record
    pub result: Option<serde_json::Value>,
    pub retries: u32,
}

impl StageOutput {
    pub fn new(update: StateUpdate) -> Self {
        Self {
            update,
            ..Default::default()
        }
    }

    pub fn with_result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Nothing to do this time
    pub fn skipped(reason: &str) -> Self {
        Self::new(StateUpdate::new()).with_result(serde_json::json!({ "skipped": reason }))
    }
}

/// A node in the orchestration graph
#[async_trait]
pub trait Stage: Send + Sync {
    fn id(&self) -> StageId;

    async fn run(&self, state: &ConversationState) -> Result<StageOutput, OrchestratorError>;
}

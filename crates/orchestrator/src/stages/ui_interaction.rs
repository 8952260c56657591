//! UI interaction stage: ask the client to show the contact form

use async_trait::async_trait;
use lead_agent_core::{ConversationState, StageId, StateUpdate, UiAction};

use super::{Stage, StageOutput};
use crate::OrchestratorError;

#[derive(Debug, Default)]
pub struct UiInteractionStage;

#[async_trait]
impl Stage for UiInteractionStage {
    fn id(&self) -> StageId {
        StageId::UiInteraction
    }

    async fn run(&self, state: &ConversationState) -> Result<StageOutput, OrchestratorError> {
        let turn = state.user_turn_count();
        tracing::debug!(session_id = %state.session_id, turn, "Requesting contact details");

        let mut update = StateUpdate::new().with_ui_action(UiAction::RequestContact);
        update.contact_prompt_turn = Some(turn);

        Ok(StageOutput::new(update).with_result(serde_json::json!({
            "ui_action": "request_contact",
            "turn": turn,
        })))
    }
}

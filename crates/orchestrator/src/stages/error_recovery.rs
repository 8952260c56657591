//! Error recovery stage

use async_trait::async_trait;
use lead_agent_core::{ChatMessage, ConversationState, StageId, StateUpdate};

use super::{Stage, StageOutput};
use crate::OrchestratorError;

pub const RECOVERY_MESSAGE: &str =
    "Sorry, I ran into a problem on my side. Could you tell me that again?";

#[derive(Debug, Default)]
pub struct ErrorRecoveryStage;

#[async_trait]
impl Stage for ErrorRecoveryStage {
    fn id(&self) -> StageId {
        StageId::ErrorRecovery
    }

    async fn run(&self, state: &ConversationState) -> Result<StageOutput, OrchestratorError> {
        let pending = state.unrecovered_errors();
        let mut update = StateUpdate {
            recover_errors: true,
            ..Default::default()
        };

        // The user is still waiting on a reply this turn
        let awaiting_reply = state.messages.last().is_some_and(|m| m.is_user());
        if awaiting_reply {
            update = update.with_message(ChatMessage::assistant(RECOVERY_MESSAGE));
        }

        tracing::info!(
            session_id = %state.session_id,
            recovered = pending,
            apologized = awaiting_reply,
            "Recovered from stage errors"
        );

        Ok(StageOutput::new(update).with_result(serde_json::json!({
            "recovered": pending,
            "apologized": awaiting_reply,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lead_agent_core::ErrorRecord;

    #[tokio::test]
    async fn test_marks_errors_recovered_and_apologizes() {
        let mut state = ConversationState::new("s1");
        state.apply(
            StateUpdate::new()
                .with_message(ChatMessage::user("hello there"))
                .with_error(ErrorRecord {
                    timestamp: Utc::now(),
                    agent: StageId::Conversation,
                    error: "LLM error: boom".into(),
                    recovered: false,
                }),
        );

        let output = ErrorRecoveryStage.run(&state).await.unwrap();
        state.apply(output.update);

        assert_eq!(state.unrecovered_errors(), 0);
        assert_eq!(
            state.messages.last().map(|m| m.content.as_str()),
            Some(RECOVERY_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_no_apology_when_reply_exists() {
        let mut state = ConversationState::new("s1");
        state.apply(
            StateUpdate::new()
                .with_message(ChatMessage::user("hello there"))
                .with_message(ChatMessage::assistant("Hi! Who am I speaking with?")),
        );

        let output = ErrorRecoveryStage.run(&state).await.unwrap();
        assert!(output.update.messages.is_empty());
    }
}
